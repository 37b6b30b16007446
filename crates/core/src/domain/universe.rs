use crate::domain::instrument::{AssetClass, Instrument};

/// (series_id, name, asset_class, region, vendor_symbol)
const DEFAULT_UNIVERSE: &[(&str, &str, AssetClass, &str, &str)] = &[
    ("US_SPY", "S&P 500 (SPY)", AssetClass::Benchmark, "US", "spy.us"),
    ("US_XLK", "Technology (XLK)", AssetClass::EquitySector, "US", "xlk.us"),
    ("US_XLF", "Financials (XLF)", AssetClass::EquitySector, "US", "xlf.us"),
    ("US_XLE", "Energy (XLE)", AssetClass::EquitySector, "US", "xle.us"),
    ("US_XLV", "Health Care (XLV)", AssetClass::EquitySector, "US", "xlv.us"),
    ("US_XLI", "Industrials (XLI)", AssetClass::EquitySector, "US", "xli.us"),
    ("US_XLY", "Consumer Discretionary (XLY)", AssetClass::EquitySector, "US", "xly.us"),
    ("US_XLP", "Consumer Staples (XLP)", AssetClass::EquitySector, "US", "xlp.us"),
    ("US_XLU", "Utilities (XLU)", AssetClass::EquitySector, "US", "xlu.us"),
    ("US_XLB", "Materials (XLB)", AssetClass::EquitySector, "US", "xlb.us"),
    ("US_XLRE", "Real Estate (XLRE)", AssetClass::EquitySector, "US", "xlre.us"),
    ("US_XLC", "Communication (XLC)", AssetClass::EquitySector, "US", "xlc.us"),
    ("COM_GLD", "Gold (GLD)", AssetClass::Commodity, "US", "gld.us"),
    ("COM_DBC", "Broad Commodities (DBC)", AssetClass::Commodity, "US", "dbc.us"),
    ("COM_USO", "Crude Oil (USO)", AssetClass::Commodity, "US", "uso.us"),
];

// Processing order matters: the first instrument to claim an article URL keeps it.
const DEFAULT_NEWS_QUERIES: &[(&str, &str)] = &[
    ("US_XLE", "oil OR crude OR OPEC OR refinery"),
    ("COM_USO", "WTI OR crude oil OR Brent OR OPEC"),
    ("COM_GLD", "gold OR inflation OR real yields OR Fed"),
    ("US_XLK", "semiconductor OR AI chips OR Nvidia OR Big Tech"),
    ("COM_DBC", "commodity prices OR commodities index"),
];

pub fn default_universe() -> Vec<Instrument> {
    DEFAULT_UNIVERSE
        .iter()
        .map(|(id, name, class, region, sym)| Instrument {
            series_id: (*id).to_string(),
            name: (*name).to_string(),
            asset_class: *class,
            region: (*region).to_string(),
            vendor_symbol: Some((*sym).to_string()),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    pub series_id: String,
    pub query: String,
}

pub fn default_news_queries() -> Vec<NewsQuery> {
    DEFAULT_NEWS_QUERIES
        .iter()
        .map(|(id, q)| NewsQuery {
            series_id: (*id).to_string(),
            query: (*q).to_string(),
        })
        .collect()
}

pub mod aggregates;
pub mod dataset;
pub mod element;
pub mod observation;
pub mod season;

pub use aggregates::{
    AggregateResults, AnnualPrecipitation, AnnualSeriesPoint, CorrelationStrength, Estimate,
    ExtremeReading, MonthlyClimatology, MonthlyTemperature, MonthlyTemperatureReport,
    PrecipitationReport, PrecipitationVariability, SeasonalDelta, SeasonalReport,
    SeasonalSummary, StationExtremes, StationTrend, TemperaturePrecipitationCorrelation,
    TrendFit, TrendReport,
};
pub use dataset::CleanedDataset;
pub use element::Element;
pub use observation::{CanonicalRow, RawRecord, RowKey};
pub use season::Season;

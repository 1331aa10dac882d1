use thiserror::Error;

#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("no backtest results available; run the backtest first")]
    NotRun,
    #[error("required column `{column}` is missing from the input data")]
    MissingData { column: String },
    #[error("input data contains no observations")]
    EmptyData,
    #[error("strategy `{name}` does not implement trade() for this mode")]
    UnimplementedStrategy { name: String },
}

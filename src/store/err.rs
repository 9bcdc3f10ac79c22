use std::fmt;

#[derive(Debug)]
pub enum StoreErr {
    PgPool(r2d2::Error),
    Pg(postgres::Error),
    Join(tokio::task::JoinError),
    Unavailable,
}

impl std::error::Error for StoreErr {}

impl fmt::Display for StoreErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        use StoreErr::*;
        let msg = match self {
            PgPool(e) => format!("{}", e),
            Pg(e) => format!("{}", e),
            Join(e) => format!("database task failed: {}", e),
            Unavailable => "the store is unavailable".to_string(),
        };
        write!(f, "{}", msg)
    }
}

impl From<r2d2::Error> for StoreErr {
    fn from(e: r2d2::Error) -> Self {
        Self::PgPool(e)
    }
}
impl From<postgres::Error> for StoreErr {
    fn from(e: postgres::Error) -> Self {
        Self::Pg(e)
    }
}
impl From<tokio::task::JoinError> for StoreErr {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Join(e)
    }
}

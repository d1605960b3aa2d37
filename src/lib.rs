pub mod appsettings;
pub mod dispatch;
pub mod models;
pub mod notify;
pub mod queue;
pub mod recovery;
pub mod storage;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_support;

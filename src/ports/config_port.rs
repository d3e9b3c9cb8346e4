//! Configuration access port trait.

use crate::domain::error::SignalError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;

    /// `Ok(None)` when the key is absent; `ConfigInvalid` when it is not an integer.
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, SignalError>;

    fn get_int_or(&self, section: &str, key: &str, default: i64) -> Result<i64, SignalError> {
        Ok(self.get_int(section, key)?.unwrap_or(default))
    }
}

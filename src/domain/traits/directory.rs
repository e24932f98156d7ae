use async_trait::async_trait;

use crate::domain::entities::CustomerProfile;
use crate::application::errors::DirectoryError;

/// Remote customer directory keyed by phone number
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Look up a customer. `Ok(None)` means the directory answered but has no match.
    async fn lookup(&self, phone: &str) -> Result<Option<CustomerProfile>, DirectoryError>;

    /// Set a customer's discount. `Ok(false)` means the directory rejected the update.
    async fn update_discount(&self, phone: &str, discount: f64) -> Result<bool, DirectoryError>;
}

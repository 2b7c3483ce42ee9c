use crate::config::Config;
use crate::error::Result;
use crate::services::MonitorController;
use std::sync::Arc;

/// Trait for button listeners that can run in different modes
#[async_trait::async_trait]
pub trait ButtonListenerTrait {
    /// Run the button listener
    async fn run(self: Box<Self>) -> Result<()>;
}

/// Factory function to create an appropriate button listener based on the dry_run flag
pub fn create_button_listener(
    config: Arc<Config>,
    controller: Arc<MonitorController>,
    dry_run: bool,
) -> Result<Box<dyn ButtonListenerTrait + Send>> {
    if dry_run {
        Ok(Box::new(
            super::dry_button_listener::DryRunButtonListener::new(config, controller)?,
        ))
    } else {
        Ok(Box::new(super::button_listener::RealButtonListener::new(
            config, controller,
        )?))
    }
}

//! Long running control loops of the scheduler.

pub mod descheduler;
pub mod scheduler;

pub use descheduler::{Descheduler, Evict};
pub use scheduler::{Bind, Scheduler};

use crate::{config::Config, pipeline::Context};

/// Runs the scheduling engine and the drift corrector until either task dies.
pub async fn run(config: &Config, ctx: Context) -> Result<(), String> {
    let scheduler = Scheduler::new(config, ctx.clone());
    let descheduler = Descheduler::new(config, ctx);

    tokio::try_join!(
        tokio::spawn(scheduler.run()),
        tokio::spawn(descheduler.run()),
    )
    .map_err(|e| format!("controller task failed: {}", e))?;
    Ok(())
}

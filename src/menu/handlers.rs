use crate::component::{BatchGenerator, ThumbnailGenerator};
use crate::config::load::load_settings;
use crate::pause;
use anyhow::Result;
use console::{Term, style};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn run_thumbnail_generator(term: &Term) -> Result<()> {
    let settings = load_settings();
    let mut generator = ThumbnailGenerator::new(settings);

    if let Err(e) = generator.run() {
        eprintln!("{} {}", style("錯誤:").red().bold(), e);
    }

    pause(term)?;
    Ok(())
}

pub fn run_batch_generator(term: &Term, shutdown_signal: &Arc<AtomicBool>) -> Result<()> {
    let settings = load_settings();
    let generator = BatchGenerator::new(settings, Arc::clone(shutdown_signal));

    if let Err(e) = generator.run() {
        eprintln!("{} {}", style("錯誤:").red().bold(), e);
    }

    pause(term)?;
    Ok(())
}

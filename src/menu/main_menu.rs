use crate::config::load::load_settings;
use crate::config::save::save_settings;
use crate::config::{PersistedSettings, ThumbnailSettings, WatermarkSettings};
use crate::menu::handlers::{run_batch_generator, run_thumbnail_generator};
use anyhow::Result;
use console::{Term, style};
use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;
use rust_i18n::t;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn show_main_menu(term: &Term, shutdown_signal: &Arc<AtomicBool>) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style(t!("main_menu.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());

    let options = vec![
        t!("main_menu.opt_generate"),
        t!("main_menu.opt_batch"),
        t!("main_menu.opt_defaults"),
        t!("main_menu.exit"),
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("main_menu.prompt"))
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => {
            run_thumbnail_generator(term)?;
            Ok(true)
        }
        Some(1) => {
            run_batch_generator(term, shutdown_signal)?;
            Ok(true)
        }
        Some(2) => {
            show_defaults_menu(term)?;
            Ok(true)
        }
        Some(3) | None => Ok(false), // ESC pressed - exit
        _ => unreachable!(),
    }
}

/// 預設值選單：檢視目前儲存的預設設定，必要時重設
fn show_defaults_menu(term: &Term) -> Result<()> {
    loop {
        term.clear_screen()?;

        println!("{}", style(t!("defaults.title")).cyan().bold());
        println!("{}", style(t!("common.esc_hint")).dim());

        let mut settings = load_settings();
        print_current_defaults(&settings);

        let options = vec![
            t!("defaults.opt_reset_thumbnail"),
            t!("defaults.opt_reset_watermark"),
            t!("defaults.opt_reset_all"),
            t!("defaults.back"),
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(t!("defaults.prompt"))
            .items(&options)
            .default(0)
            .interact_on_opt(term)?;

        match selection {
            Some(0) => {
                settings.thumbnail = ThumbnailSettings::default();
                save_settings(&settings)?;
                show_saved_notice();
            }
            Some(1) => {
                settings.watermark = WatermarkSettings::default();
                save_settings(&settings)?;
                show_saved_notice();
            }
            Some(2) => {
                save_settings(&PersistedSettings::default())?;
                show_saved_notice();
            }
            Some(3) | None => break, // ESC or back
            _ => unreachable!(),
        }
    }

    Ok(())
}

fn print_current_defaults(settings: &PersistedSettings) {
    let thumbnail = &settings.thumbnail;
    let watermark = &settings.watermark;

    println!();
    println!(
        "  {} {} | {}x{} | {} | randomize: {}",
        style(t!("defaults.current_thumbnail")).dim(),
        thumbnail.mode,
        thumbnail.rows,
        thumbnail.columns,
        thumbnail.output_format,
        thumbnail.randomize
    );
    println!(
        "  {} {} | {}% | {}",
        style(t!("defaults.current_watermark")).dim(),
        watermark.kind,
        watermark.opacity,
        watermark.position
    );
    println!();
}

fn show_saved_notice() {
    println!("\n{}", style(t!("defaults.saved")).green());
    std::thread::sleep(std::time::Duration::from_secs(1));
}

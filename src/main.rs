use anyhow::Result;
use console::{Term, style};
use log::{info, warn};
use rust_i18n::t;
use video_thumbnail_maker::init;
use video_thumbnail_maker::menu::show_main_menu;
use video_thumbnail_maker::signal::setup_shutdown_signal;

rust_i18n::i18n!("locales", fallback = "en-US");

fn main() -> Result<()> {
    init::init();
    let term = Term::stdout();
    let shutdown_signal = setup_shutdown_signal();

    // 依環境變數挑介面語言，其餘情況維持英文
    if std::env::var("LANG").is_ok_and(|lang| lang.starts_with("zh")) {
        rust_i18n::set_locale("zh-TW");
    }

    loop {
        match show_main_menu(&term, &shutdown_signal) {
            Ok(true) => {}
            Ok(false) => {
                term.clear_screen()?;
                println!("\n{}", style(t!("main_menu.goodbye")).green().bold());
                info!("程式正常結束");
                break;
            }
            Err(e) => {
                warn!("程式錯誤: {e}");
                eprintln!("{} {}", style(t!("main_menu.error_prefix")).red().bold(), e);
                break;
            }
        }
    }

    Ok(())
}

//! Native clipboard and notification plumbing.

use std::sync::Arc;

use crate::pipeline::{ClipboardSource, Delivery, Outcome};
use crate::wrap::wrap_text;

#[cfg(windows)]
mod native {
    use crate::pipeline::ClipboardSource;
    use windows::Win32::System::DataExchange::GetClipboardSequenceNumber;

    pub struct WinClipboard;

    impl ClipboardSource for WinClipboard {
        fn change_counter(&self) -> u64 {
            unsafe { GetClipboardSequenceNumber() as u64 }
        }

        fn current_text(&self) -> Option<String> {
            clipboard_win::get_clipboard_string().ok()
        }
    }

    pub fn toast(title: &str, body: &str) {
        let _ = winrt_notification::Toast::new(winrt_notification::Toast::POWERSHELL_APP_ID)
            .title(title)
            .text1(body)
            .show();
    }
}

/// Clipboard that never changes, for platforms without a native backend.
pub struct StaticClipboard;

impl ClipboardSource for StaticClipboard {
    fn change_counter(&self) -> u64 {
        0
    }

    fn current_text(&self) -> Option<String> {
        None
    }
}

pub fn default_clipboard() -> Arc<dyn ClipboardSource> {
    #[cfg(windows)]
    {
        Arc::new(native::WinClipboard)
    }
    #[cfg(not(windows))]
    {
        tracing::warn!("No native clipboard backend on this platform; double copy is inactive");
        Arc::new(StaticClipboard)
    }
}

fn title(delivery: &Delivery) -> String {
    match &delivery.outcome {
        Outcome::Translated(r) => format!("{} → {}", r.source_language, r.target_language),
        Outcome::Failed(_) => "Translation failed".to_string(),
    }
}

/// Shows one delivery: stdout everywhere, plus a toast on Windows.
pub fn show(delivery: &Delivery, max_line_length: Option<usize>) {
    let heading = title(delivery);
    let body = wrap_text(&delivery.display_text(), max_line_length);
    println!("[#{}] {}\n{}\n", delivery.run, heading, body);
    #[cfg(windows)]
    native::toast(&heading, &body);
}

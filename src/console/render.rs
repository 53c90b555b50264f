use crossterm::cursor::MoveToColumn;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;
use std::io::{self, Write};
use tracing::warn;

use crate::app::notify::{NotificationSink, Tone};
use crate::chat::ChatExchange;
use crate::console::theme::Theme;
use crate::ingest::{ProgressSnapshot, ProgressView};

const BAR_WIDTH: usize = 30;

fn write_colored<W: Write>(out: &mut W, theme: &Theme, color: Color, text: &str) -> io::Result<()> {
    if theme.enabled {
        out.queue(SetForegroundColor(color))?
            .queue(Print(text))?
            .queue(ResetColor)?;
    } else {
        out.write_all(text.as_bytes())?;
    }
    Ok(())
}

/// Status lines and chat transcript on stdout.
pub struct ConsoleSink<W: Write = io::Stdout> {
    out: W,
    theme: Theme,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout(theme: Theme) -> Self {
        Self::new(io::stdout(), theme)
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W, theme: Theme) -> Self {
        Self { out, theme }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn print_exchange(&mut self, exchange: &ChatExchange) {
        if let Err(e) = self.write_exchange(exchange) {
            warn!("Failed to write chat exchange: {}", e);
        }
    }

    fn write_exchange(&mut self, exchange: &ChatExchange) -> io::Result<()> {
        let meta = format!(
            "  latency {} | tokens {} | docs {}",
            exchange.latency_label(),
            exchange.tokens_label(),
            exchange.docs_label()
        );
        write_colored(&mut self.out, &self.theme, self.theme.accent, "assistant> ")?;
        writeln!(self.out, "{}", exchange.response_text)?;
        write_colored(&mut self.out, &self.theme, self.theme.secondary, &meta)?;
        writeln!(self.out)?;
        self.out.flush()
    }

    pub fn print_prompt(&mut self, badge: &str) {
        let prompt = format!("[{}] > ", badge);
        let result = write_colored(&mut self.out, &self.theme, self.theme.secondary, &prompt)
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            warn!("Failed to write prompt: {}", e);
        }
    }

    pub fn print_line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            warn!("Failed to write to console: {}", e);
        }
    }
}

impl<W: Write> NotificationSink for ConsoleSink<W> {
    fn notify(&mut self, message: &str, tone: Tone) {
        let color = self.theme.tone(tone);
        let result = write_colored(&mut self.out, &self.theme, color, message)
            .and_then(|_| writeln!(self.out))
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            warn!("Failed to write notice: {}", e);
        }
    }
}

/// Single-line progress bar redrawn in place on stderr.
pub struct TerminalProgress<W: Write = io::Stderr> {
    out: W,
    theme: Theme,
}

impl TerminalProgress<io::Stderr> {
    pub fn stderr(theme: Theme) -> Self {
        Self::new(io::stderr(), theme)
    }
}

impl<W: Write> TerminalProgress<W> {
    pub fn new(out: W, theme: Theme) -> Self {
        Self { out, theme }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self, snapshot: &ProgressSnapshot) -> io::Result<()> {
        if self.theme.enabled {
            self.out
                .queue(MoveToColumn(0))?
                .queue(Clear(ClearType::CurrentLine))?;
        } else {
            self.out.write_all(b"\r")?;
        }

        if snapshot.visible {
            let line = progress_line(snapshot);
            write_colored(&mut self.out, &self.theme, self.theme.accent, &line)?;
            if !self.theme.enabled && snapshot.percent == 100 && !snapshot.indeterminate {
                self.out.write_all(b"\n")?;
            }
        }
        self.out.flush()
    }
}

impl<W: Write + Send> ProgressView for TerminalProgress<W> {
    fn render(&mut self, snapshot: &ProgressSnapshot) {
        if let Err(e) = self.draw(snapshot) {
            warn!("Failed to draw progress: {}", e);
        }
    }
}

/// `[#####.........] 42%`, or a plain label while the size is unknown.
pub fn progress_line(snapshot: &ProgressSnapshot) -> String {
    if snapshot.indeterminate {
        return "Uploading...".to_string();
    }
    let percent = snapshot.percent.min(100) as usize;
    let filled = percent * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        percent
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ChatRequest, LatencySource};

    #[test]
    fn test_progress_line() {
        let half = ProgressSnapshot {
            visible: true,
            percent: 50,
            indeterminate: false,
        };
        assert_eq!(
            progress_line(&half),
            format!("[{}{}]  50%", "#".repeat(15), ".".repeat(15))
        );

        let unknown = ProgressSnapshot {
            visible: true,
            percent: 0,
            indeterminate: true,
        };
        assert_eq!(progress_line(&unknown), "Uploading...");
    }

    #[test]
    fn test_plain_notice_has_no_escapes() {
        let mut sink = ConsoleSink::new(Vec::new(), Theme::plain());
        sink.notify("Ready to chat.", Tone::Ok);
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "Ready to chat.\n");
    }

    #[test]
    fn test_exchange_shows_metadata() {
        let request = ChatRequest {
            tenant_id: "acme".to_string(),
            session_id: "s".to_string(),
            message: "hi".to_string(),
        };
        let exchange = ChatExchange::new(request, "Hello there".to_string(), 12.0, LatencySource::Server);

        let mut sink = ConsoleSink::new(Vec::new(), Theme::plain());
        sink.print_exchange(&exchange);
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.contains("assistant> Hello there"));
        assert!(text.contains("latency 12 ms | tokens -- | docs --"));
    }

    #[test]
    fn test_hidden_snapshot_clears_line() {
        let mut view = TerminalProgress::new(Vec::new(), Theme::plain());
        view.render(&ProgressSnapshot {
            visible: false,
            percent: 0,
            indeterminate: false,
        });
        assert_eq!(view.into_inner(), b"\r".to_vec());
    }
}

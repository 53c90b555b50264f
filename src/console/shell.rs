use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::app::notify::{NotificationSink, Tone};
use crate::app::{IngestReport, Workbench};
use crate::console::commands::{CommandParser, ShellCommand, HELP_TEXT};
use crate::console::files::{load_selection, STDIN_ARG};
use crate::console::render::ConsoleSink;
use crate::error::Result;
use crate::ingest::ProgressView;

pub const CLEARED_MESSAGE: &str = "Chat cleared. Ask another question whenever you're ready.";

/// Interactive loop over stdin lines until `/quit` or end of input.
pub async fn run<W, V>(bench: &mut Workbench<ConsoleSink<W>, V>) -> Result<()>
where
    W: Write,
    V: ProgressView + Send,
{
    info!("Shell started");
    let notice = bench.session().status_notice();
    let tone = tone_for(bench.session().is_chat_ready());
    bench.sink_mut().print_line("TourAssist shell. Type /help for commands.");
    bench.sink_mut().notify(notice, tone);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let badge = bench.session().badge();
        bench.sink_mut().print_prompt(&badge);

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let Some(command) = CommandParser::parse(&line) else {
            continue;
        };
        if !handle(bench, command).await {
            break;
        }
    }

    info!("Shell finished");
    Ok(())
}

fn tone_for(ok: bool) -> Tone {
    if ok {
        Tone::Ok
    } else {
        Tone::Error
    }
}

/// Loads the selected paths, reports anything left out, then ingests the
/// rest.
pub async fn ingest_selection<W, V>(
    bench: &mut Workbench<ConsoleSink<W>, V>,
    args: &[String],
) -> Option<IngestReport>
where
    W: Write,
    V: ProgressView + Send,
{
    let selection = match load_selection(args).await {
        Ok(selection) => selection,
        Err(e) => {
            bench.sink_mut().notify(&e.to_string(), Tone::Error);
            return None;
        }
    };
    for skipped in &selection.skipped {
        bench.sink_mut().notify(&skipped.notice(), Tone::Error);
    }
    bench.ingest(selection.files).await
}

/// Runs one command. Returns `false` when the shell should exit.
pub async fn handle<W, V>(bench: &mut Workbench<ConsoleSink<W>, V>, command: ShellCommand) -> bool
where
    W: Write,
    V: ProgressView + Send,
{
    debug!("Shell command: {:?}", command);
    match command {
        ShellCommand::Message(message) => {
            if let Some(exchange) = bench.chat(&message).await {
                bench.sink_mut().print_exchange(&exchange);
            }
        }
        ShellCommand::Ingest(args) => {
            if args.iter().any(|arg| arg == STDIN_ARG) {
                bench.sink_mut().notify(
                    "Reading from stdin is only available with `tourassist ingest -`.",
                    Tone::Error,
                );
                return true;
            }
            ingest_selection(bench, &args).await;
        }
        ShellCommand::ShowSession => {
            let session = bench.session();
            let line = format!("{} [{}]", session.status_notice(), session.badge());
            let tone = tone_for(session.is_chat_ready());
            bench.sink_mut().notify(&line, tone);
        }
        ShellCommand::SaveSession {
            tenant_id,
            api_key,
            session_id,
        } => {
            bench.save_session(&tenant_id, &api_key, &session_id).await;
        }
        ShellCommand::CreateTenant(tenant_id) => {
            bench.create_tenant(&tenant_id).await;
        }
        ShellCommand::Clear => bench.sink_mut().notify(CLEARED_MESSAGE, Tone::Neutral),
        ShellCommand::Help => bench.sink_mut().print_line(HELP_TEXT),
        ShellCommand::Quit => return false,
        ShellCommand::Unknown(what) => bench
            .sink_mut()
            .notify(&format!("Unknown command: {}. Type /help.", what), Tone::Error),
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::theme::Theme;
    use crate::ingest::{HttpUploader, ProgressSnapshot};
    use crate::platform::MemoryStore;
    use crate::service::ServiceClient;
    use crate::session::{ConfigStore, SessionState};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    struct NullView;

    impl ProgressView for NullView {
        fn render(&mut self, _snapshot: &ProgressSnapshot) {}
    }

    async fn bench(base_url: String) -> Workbench<ConsoleSink<Vec<u8>>, NullView> {
        let store = ConfigStore::new(Arc::new(MemoryStore::new()));
        let session = SessionState::restore(store).await.unwrap();
        let client = ServiceClient::with_base_url(base_url).unwrap();
        Workbench::new(
            session,
            client.clone(),
            Arc::new(HttpUploader::new(client, 1024)),
            Duration::ZERO,
            ConsoleSink::new(Vec::new(), Theme::plain()),
            NullView,
        )
    }

    fn output(bench: Workbench<ConsoleSink<Vec<u8>>, NullView>) -> String {
        String::from_utf8(bench.into_parts().0.into_inner()).unwrap()
    }

    #[tokio::test]
    async fn test_chat_round_trip_prints_exchange() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat");
            then.status(200)
                .json_body(json!({ "response": "The museum opens at 9.", "tokens_used": 12 }));
        });

        let mut bench = bench(server.base_url()).await;
        assert!(
            handle(
                &mut bench,
                ShellCommand::SaveSession {
                    tenant_id: "acme".to_string(),
                    api_key: "k".to_string(),
                    session_id: "s".to_string(),
                },
            )
            .await
        );
        assert!(handle(&mut bench, ShellCommand::Message("When?".to_string())).await);

        let text = output(bench);
        assert!(text.contains("Ready to chat. [acme/s]"));
        assert!(text.contains("assistant> The museum opens at 9."));
        assert!(text.contains("tokens 12"));
    }

    #[tokio::test]
    async fn test_stdin_rejected_inside_shell() {
        let mut bench = bench("http://127.0.0.1:1".to_string()).await;
        handle(&mut bench, ShellCommand::Ingest(vec!["-".to_string()])).await;
        assert!(output(bench).contains("only available"));
    }

    #[tokio::test]
    async fn test_ingest_skips_missing_and_uploads_rest() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/ingest");
            then.status(200).json_body(json!({ "chunks_indexed": 2 }));
        });
        let temp_dir = tempfile::TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("guide.txt"), "hello").unwrap();

        let mut bench = bench(server.base_url()).await;
        bench.save_session("acme", "k", "s").await.unwrap();
        let args = vec![
            temp_dir.path().join("missing.pdf").to_string_lossy().into_owned(),
            temp_dir.path().join("guide.txt").to_string_lossy().into_owned(),
        ];
        let report = ingest_selection(&mut bench, &args).await;

        assert!(matches!(report, Some(IngestReport::Single { result: Ok(_), .. })));
        assert_eq!(mock.calls(), 1);
        let text = output(bench);
        assert!(text.contains("Skipped "));
        assert!(text.contains("Indexed 2 chunks from guide.txt."));
    }

    #[tokio::test]
    async fn test_quit_and_unknown() {
        let mut bench = bench("http://127.0.0.1:1".to_string()).await;
        assert!(!handle(&mut bench, ShellCommand::Quit).await);
        assert!(handle(&mut bench, ShellCommand::Unknown("bogus".to_string())).await);
        assert!(handle(&mut bench, ShellCommand::Clear).await);

        let text = output(bench);
        assert!(text.contains("Unknown command: bogus. Type /help."));
        assert!(text.contains(CLEARED_MESSAGE));
    }
}

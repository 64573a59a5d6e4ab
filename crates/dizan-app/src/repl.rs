//! Terminal chat: one question per line, reply streamed to stdout.

use std::io::Write;

use dizan_ai::{CompletionService, Session, Submission};
use dizan_common::DizanError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::boot::Runtime;
use crate::render::{self, ASSISTANT_LABEL, USER_LABEL};

pub async fn run(runtime: Runtime) -> Result<(), DizanError> {
    let session = Session::new(runtime.preamble).with_options(runtime.options);
    tracing::info!(session_id = %session.id(), "Terminal session started");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    writeln!(
        stdout,
        "Dr. Dizan Therapy Chatbot. What is bothering you? (Ctrl-D to leave)"
    )?;

    chat(&session, runtime.service.as_ref(), stdin, &mut stdout).await?;

    tracing::info!(
        session_id = %session.id(),
        turns = session.turn_count(),
        "Terminal session ended"
    );
    Ok(())
}

/// Drive one session from `input` until EOF.
pub async fn chat<R, W>(
    session: &Session,
    service: &dyn CompletionService,
    input: R,
    out: &mut W,
) -> Result<(), DizanError>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send,
{
    let mut lines = input.lines();
    loop {
        write!(out, "{USER_LABEL}: ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }

        let mut started = false;
        let result = session
            .submit_streaming(service, &line, |fragment| {
                if !started {
                    let _ = write!(out, "{ASSISTANT_LABEL}: ");
                    started = true;
                }
                let _ = write!(out, "{fragment}");
                let _ = out.flush();
            })
            .await;

        match result {
            Ok(Submission::Answered(_)) => writeln!(out)?,
            Ok(Submission::Ignored) => {}
            Err(e) => {
                if started {
                    writeln!(out)?;
                }
                tracing::warn!(session_id = %session.id(), error = %e, "Submission failed");
                writeln!(out, "[{}]", render::notice(&e))?;
            }
        }
    }
}

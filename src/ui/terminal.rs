use log::info;
use std::error::Error;
use tokio::io::{ AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader };

use super::client::AgentApi;
use super::session::{ Alignment, ChatSession, RenderedRow };

pub const GREETING: &str = "Reiseagent‑Prototyp. Erzähl mir von deinen Reiseplänen… (leere Zeile ignoriert, Strg+D beendet)";

fn format_row(row: &RenderedRow) -> String {
    match row.alignment {
        Alignment::Right => format!("{:>60}", format!("{}: {}", row.label, row.content)),
        Alignment::Left => format!("{}: {}", row.label, row.content),
    }
}

async fn print_rows<W: AsyncWrite + Unpin>(out: &mut W, rows: &[RenderedRow]) -> std::io::Result<()> {
    for row in rows {
        out.write_all(format_row(row).as_bytes()).await?;
        out.write_all(b"\n").await?;
    }
    out.flush().await
}

/// Line-based chat loop over stdin/stdout. Each line is one submission.
pub async fn run_terminal_chat(api: AgentApi) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("Chatting with {}", api.url());
    let input = BufReader::new(tokio::io::stdin());
    let session = chat_loop(&api, input, tokio::io::stdout()).await?;
    info!("Chat ended after {} message(s)", session.conversation().len());
    Ok(())
}

/// Drives one `ChatSession` from `input` until EOF, echoing rows to `out`.
pub async fn chat_loop<R, W>(api: &AgentApi, input: R, mut out: W) -> std::io::Result<ChatSession>
    where R: AsyncBufRead + Unpin, W: AsyncWrite + Unpin
{
    let mut lines = input.lines();
    let mut session = ChatSession::new();

    out.write_all(format!("{}\n", GREETING).as_bytes()).await?;
    out.flush().await?;

    while let Some(line) = lines.next_line().await? {
        session.set_input(line);
        let Some(turn) = session.submit() else {
            continue;
        };

        let shown = session.conversation().len() - 1;
        print_rows(&mut out, &session.render()[shown..]).await?;

        let outcome = api.send(&turn.messages).await;
        session.resolve(turn.id, outcome);

        let rows = session.render();
        print_rows(&mut out, &rows[rows.len() - 1..]).await?;
    }

    Ok(session)
}

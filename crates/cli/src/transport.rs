//! JSON-lines transport between the coordinator and a UI over stdio.
//!
//! Inbound lines are [`Intent`]s (`{"type":"search","query":"pdf"}`).
//! Outbound lines are snapshots and notices, tagged the same way.

use {
    serde::Serialize,
    skilldeck_sidebar::{Intent, Notice, SidebarHandle, ViewSnapshot},
    tokio::{
        io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
        sync::{mpsc, watch},
    },
    tracing::{debug, warn},
};

/// One line written to the UI.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Outbound {
    Snapshot(Box<ViewSnapshot>),
    Notice(Notice),
}

/// Decode one inbound line. Blank lines yield `None`.
pub fn decode_line(line: &str) -> Option<skilldeck_sidebar::Result<Intent>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(line.parse())
}

/// Feed intents from `input` to the coordinator until EOF or until the
/// coordinator stops. Malformed lines are reported back as notices.
pub async fn read_intents<R>(
    input: R,
    handle: SidebarHandle,
    outbound: mpsc::UnboundedSender<Outbound>,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        match decode_line(&line) {
            None => {},
            Some(Ok(intent)) => {
                if handle.intent(intent).is_err() {
                    debug!("coordinator stopped, no longer reading intents");
                    break;
                }
            },
            Some(Err(e)) => {
                warn!(error = %e, "ignoring malformed intent");
                let _ = outbound.send(Outbound::Notice(Notice::error(e.to_string())));
            },
        }
    }
    Ok(())
}

/// Forward every published snapshot, starting with the current one.
pub async fn forward_snapshots(
    mut snapshots: watch::Receiver<ViewSnapshot>,
    outbound: mpsc::UnboundedSender<Outbound>,
) {
    loop {
        let snapshot = snapshots.borrow_and_update().clone();
        if outbound.send(Outbound::Snapshot(Box::new(snapshot))).is_err() {
            return;
        }
        if snapshots.changed().await.is_err() {
            return;
        }
    }
}

/// Write outbound messages as JSON lines until every sender is gone.
pub async fn write_lines<W>(
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    mut out: W,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = outbound.recv().await {
        let mut line = serde_json::to_vec(&message)?;
        line.push(b'\n');
        out.write_all(&line).await?;
        out.flush().await?;
    }
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::Value, skilldeck_sidebar::Panel};

    #[test]
    fn blank_lines_are_skipped() {
        assert!(decode_line("   ").is_none());
        assert!(decode_line("").is_none());
    }

    #[test]
    fn intents_decode_from_lines() {
        let intent = decode_line(r#" {"type":"setActivePanel","panel":"marketplace"} "#)
            .unwrap()
            .unwrap();
        assert_eq!(intent, Intent::SetActivePanel {
            panel: Panel::Marketplace
        });
        assert!(decode_line("{not json").unwrap().is_err());
    }

    #[tokio::test]
    async fn messages_are_written_one_per_line() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Outbound::Notice(Notice::info("Installed pdf")))
            .unwrap();
        tx.send(Outbound::Snapshot(Box::default())).unwrap();
        drop(tx);

        let mut out = Vec::new();
        write_lines(rx, &mut out).await.unwrap();
        let lines: Vec<Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "notice");
        assert_eq!(lines[0]["level"], "info");
        assert_eq!(lines[0]["message"], "Installed pdf");
        assert_eq!(lines[1]["type"], "snapshot");
        assert_eq!(lines[1]["activePanel"], "installed");
        assert!(lines[1]["installed"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn forwarding_starts_with_current_snapshot() {
        let (snapshots_tx, snapshots_rx) = watch::channel(ViewSnapshot::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(forward_snapshots(snapshots_rx, tx));

        let Some(Outbound::Snapshot(first)) = rx.recv().await else {
            panic!("expected a snapshot");
        };
        assert_eq!(first.revision, 0);

        snapshots_tx.send_modify(|s| s.revision = 4);
        let Some(Outbound::Snapshot(next)) = rx.recv().await else {
            panic!("expected a snapshot");
        };
        assert_eq!(next.revision, 4);

        drop(snapshots_tx);
        task.await.unwrap();
    }
}

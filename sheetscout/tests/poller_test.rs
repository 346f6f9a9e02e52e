use anyhow::Result;
use sheetscout::transport::ChatId;
use sheetscout::{
    BotConfig, CommandHandler, MemorySource, Messages, Notifier, Poller, SearchError,
    SearchResult, SearchService, SearchSettings, Transport, Update,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Transport that hands out scripted batches, then raises the shutdown flag
struct ScriptedTransport {
    batches: Mutex<VecDeque<SearchResult<Vec<Update>>>>,
    offsets: Mutex<Vec<Option<i64>>>,
    shutdown: Arc<AtomicBool>,
}

impl ScriptedTransport {
    fn new(batches: Vec<SearchResult<Vec<Update>>>, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            offsets: Mutex::new(Vec::new()),
            shutdown,
        }
    }

    fn offsets(&self) -> Vec<Option<i64>> {
        self.offsets.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn get_updates(&self, offset: Option<i64>) -> SearchResult<Vec<Update>> {
        self.offsets.lock().unwrap().push(offset);
        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(batch) => batch,
            None => {
                self.shutdown.store(true, Ordering::SeqCst);
                Ok(Vec::new())
            }
        }
    }
}

/// Notifier that records replies and fails for one chat
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(ChatId, String)>>,
    failing_chat: Option<ChatId>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<(ChatId, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn reply(&self, chat_id: ChatId, text: &str) -> SearchResult<()> {
        if self.failing_chat == Some(chat_id) {
            return Err(SearchError::transport("chat not found"));
        }
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}

fn handler() -> CommandHandler {
    let source = MemorySource::new().with_partition(
        "Sheet1",
        vec![
            vec!["h1", "vijay header"],
            vec!["h2"],
            vec!["h3"],
            vec!["SongA", "Vijay Hits"],
            vec!["SongB", "Other"],
        ],
    );
    let service = SearchService::new(Arc::new(source), SearchSettings::default());
    CommandHandler::new(service, Messages::from_config(&BotConfig::default()))
}

fn poller(
    transport: Arc<ScriptedTransport>,
    notifier: Arc<RecordingNotifier>,
) -> Result<Poller> {
    Ok(Poller::new(
        transport,
        notifier,
        handler(),
        4,
        Duration::from_millis(10),
    )?)
}

#[test]
fn test_batch_replies_in_update_order() -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let transport = Arc::new(ScriptedTransport::new(
        vec![Ok(vec![
            Update::text_message(5, 100, "/start"),
            Update::text_message(6, 200, "/search complete vijay"),
            Update::text_message(7, 300, "hello there"),
            Update::text_message(8, 400, "/search live"),
            Update::text_message(9, 500, "/unknown"),
            Update::text_message(10, 600, "/search foo bar"),
        ])],
        shutdown.clone(),
    ));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut poller = poller(transport.clone(), notifier.clone())?;

    assert_eq!(poller.run_once()?, 6);
    assert_eq!(poller.offset(), Some(11));

    let sent = notifier.sent();
    let chats: Vec<ChatId> = sent.iter().map(|(chat, _)| *chat).collect();
    assert_eq!(chats, vec![100, 200, 400, 600]);
    assert!(sent[0].1.starts_with("👋 Welcome to"));
    assert_eq!(sent[1].1, "SongA — Vijay Hits");
    assert!(sent[2].1.starts_with("❗Usage:"));
    assert!(sent[3].1.starts_with("❗Invalid mode."));

    let stats = poller.metrics().get_stats();
    assert_eq!(stats.commands_received, 4);
    assert_eq!(stats.replies_sent, 4);
    Ok(())
}

#[test]
fn test_offset_advances_past_failed_replies() -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let transport = Arc::new(ScriptedTransport::new(
        vec![
            Ok(vec![
                Update::text_message(1, 13, "/start"),
                Update::text_message(2, 14, "/start"),
            ]),
            Ok(vec![Update::text_message(3, 14, "/search complete other")]),
        ],
        shutdown.clone(),
    ));
    let notifier = Arc::new(RecordingNotifier {
        failing_chat: Some(13),
        ..RecordingNotifier::default()
    });
    let mut poller = poller(transport.clone(), notifier.clone())?;

    poller.run_once()?;
    poller.run_once()?;

    assert_eq!(transport.offsets(), vec![None, Some(3)]);
    assert_eq!(poller.offset(), Some(4));

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1], (14, "SongB — Other".to_string()));

    let stats = poller.metrics().get_stats();
    assert_eq!(stats.replies_sent, 2);
    assert_eq!(stats.reply_failures, 1);
    Ok(())
}

#[test]
fn test_updates_without_text_only_move_offset() -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let transport = Arc::new(ScriptedTransport::new(
        vec![Ok(vec![
            Update {
                update_id: 41,
                chat_id: Some(1),
                text: None,
            },
            Update {
                update_id: 42,
                chat_id: None,
                text: None,
            },
        ])],
        shutdown,
    ));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut poller = poller(transport, notifier.clone())?;

    assert_eq!(poller.run_once()?, 2);
    assert_eq!(poller.offset(), Some(43));
    assert!(notifier.sent().is_empty());
    Ok(())
}

#[test]
fn test_poll_failure_is_reported_and_keeps_offset() -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let transport = Arc::new(ScriptedTransport::new(
        vec![
            Ok(vec![Update::text_message(7, 1, "/start")]),
            Err(SearchError::transport("getUpdates failed: connection reset")),
        ],
        shutdown,
    ));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut poller = poller(transport, notifier)?;

    poller.run_once()?;
    let err = poller.run_once().unwrap_err();
    assert!(matches!(err, SearchError::Transport(_)));
    assert_eq!(poller.offset(), Some(8));
    assert_eq!(poller.metrics().get_stats().poll_failures, 1);
    Ok(())
}

#[test]
fn test_run_survives_failures_until_shutdown() -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let transport = Arc::new(ScriptedTransport::new(
        vec![
            Err(SearchError::transport("getUpdates failed: timeout")),
            Ok(vec![Update::text_message(1, 9, "/search complete VIJAY")]),
            Err(SearchError::transport("getUpdates rejected (HTTP 502)")),
            Ok(vec![Update::text_message(2, 9, "/search date vijay")]),
        ],
        shutdown.clone(),
    ));
    let notifier = Arc::new(RecordingNotifier::default());
    let mut poller = poller(transport.clone(), notifier.clone())?;

    poller.run(&shutdown);

    assert!(shutdown.load(Ordering::SeqCst));
    assert_eq!(transport.offsets().len(), 5);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].1, "SongA — Vijay Hits");
    // Sheet2 is not served by the source
    assert_eq!(sent[1].1, sheetscout::messages::SOURCE_ERROR);

    let stats = poller.metrics().get_stats();
    assert_eq!(stats.poll_failures, 2);
    assert_eq!(stats.source_failures, 1);
    Ok(())
}

/// Transport with nothing to deliver, pausing like a long poll
struct IdleTransport {
    polls: AtomicUsize,
}

impl Transport for IdleTransport {
    fn get_updates(&self, _offset: Option<i64>) -> SearchResult<Vec<Update>> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(5));
        Ok(Vec::new())
    }
}

#[test]
fn test_run_stops_when_flag_is_raised_elsewhere() -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let transport = Arc::new(IdleTransport {
        polls: AtomicUsize::new(0),
    });
    let notifier = Arc::new(RecordingNotifier::default());
    let mut poller = Poller::new(
        transport.clone(),
        notifier,
        handler(),
        2,
        Duration::from_millis(10),
    )?;

    let flag = shutdown.clone();
    let signal = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        flag.store(true, Ordering::Relaxed);
    });

    poller.run(&shutdown);
    signal.join().expect("signal thread panicked");

    assert!(transport.polls.load(Ordering::SeqCst) >= 1);
    assert!(poller.offset().is_none());
    Ok(())
}

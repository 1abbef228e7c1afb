use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, trace, warn};

use crate::words::{DeckManager, Language, Tier, WordRecord};

/// Supplies the engine with its next word without blocking a tick.
///
/// The engine calls `request` when it needs a word and then `poll`s on each
/// tick until one is ready. A new `request` supersedes any earlier one.
///
/// A word drawn for a superseded or cancelled request has already left its
/// deck's pass and is not served again before the next pass; feeds log it at
/// debug level when they drop it.
pub trait WordFeed {
    /// Start the deck for `level` over so a new session does not pick up mid-pass
    fn restart(&mut self, tier: Tier, language: Language, level: u32);
    fn request(&mut self, tier: Tier, language: Language, level: u32);
    fn poll(&mut self) -> Option<WordRecord>;
    /// Forget the outstanding request, if any
    fn cancel(&mut self);
}

/// Resolves every request immediately against the deck manager
pub struct DirectFeed {
    manager: Arc<DeckManager>,
    ready: Option<WordRecord>,
}

impl DirectFeed {
    pub fn new(manager: Arc<DeckManager>) -> Self {
        Self {
            manager,
            ready: None,
        }
    }

    pub fn manager(&self) -> &Arc<DeckManager> {
        &self.manager
    }
}

impl DirectFeed {
    fn discard(&mut self, why: &str) {
        if let Some(word) = self.ready.take() {
            debug!(word = %word.text, why, "dropping unserved word");
        }
    }
}

impl WordFeed for DirectFeed {
    fn restart(&mut self, tier: Tier, language: Language, level: u32) {
        self.discard("restart");
        self.manager.restart(tier, language, level);
    }

    fn request(&mut self, tier: Tier, language: Language, level: u32) {
        self.discard("superseded");
        self.ready = Some(self.manager.next_word(tier, language, level));
    }

    fn poll(&mut self) -> Option<WordRecord> {
        self.ready.take()
    }

    fn cancel(&mut self) {
        self.discard("cancelled");
    }
}

enum FeedRequest {
    Draw {
        generation: u64,
        tier: Tier,
        language: Language,
        level: u32,
    },
    Restart {
        tier: Tier,
        language: Language,
        level: u32,
    },
}

/// Draws words on a worker thread so a slow candidate source never stalls
/// the game loop. Answers to superseded requests are discarded.
pub struct ThreadedFeed {
    requests: Option<Sender<FeedRequest>>,
    answers: Receiver<(u64, WordRecord)>,
    generation: u64,
    worker: Option<JoinHandle<()>>,
}

impl ThreadedFeed {
    pub fn new(manager: Arc<DeckManager>) -> Self {
        let (req_tx, req_rx) = mpsc::channel::<FeedRequest>();
        let (ans_tx, ans_rx) = mpsc::channel();

        let worker = thread::spawn(move || {
            // requests are handled in order, so a restart lands before the
            // draws queued after it
            for req in req_rx {
                match req {
                    FeedRequest::Draw {
                        generation,
                        tier,
                        language,
                        level,
                    } => {
                        let word = manager.next_word(tier, language, level);
                        trace!(generation, word = %word.text, "feed drew word");
                        if ans_tx.send((generation, word)).is_err() {
                            break;
                        }
                    }
                    FeedRequest::Restart {
                        tier,
                        language,
                        level,
                    } => manager.restart(tier, language, level),
                }
            }
            debug!("feed worker stopped");
        });

        Self {
            requests: Some(req_tx),
            answers: ans_rx,
            generation: 0,
            worker: Some(worker),
        }
    }
}

impl ThreadedFeed {
    fn send(&self, req: FeedRequest) {
        let Some(tx) = &self.requests else {
            return;
        };
        if tx.send(req).is_err() {
            warn!("feed worker is gone, request dropped");
        }
    }
}

impl WordFeed for ThreadedFeed {
    fn restart(&mut self, tier: Tier, language: Language, level: u32) {
        // answers still in flight belong to the old pass
        self.generation += 1;
        self.send(FeedRequest::Restart {
            tier,
            language,
            level,
        });
    }

    fn request(&mut self, tier: Tier, language: Language, level: u32) {
        self.generation += 1;
        self.send(FeedRequest::Draw {
            generation: self.generation,
            tier,
            language,
            level,
        });
    }

    fn poll(&mut self) -> Option<WordRecord> {
        loop {
            match self.answers.try_recv() {
                Ok((generation, word)) if generation == self.generation => return Some(word),
                Ok((generation, word)) => {
                    debug!(generation, word = %word.text, "dropping stale word");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        }
    }

    /// The answer to the cancelled request is dropped, with a debug log, by
    /// the next `poll`
    fn cancel(&mut self) {
        self.generation += 1;
    }
}

impl Drop for ThreadedFeed {
    fn drop(&mut self) {
        // closing the request channel ends the worker loop
        self.requests.take();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

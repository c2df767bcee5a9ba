//! Thread-safe parser pool for tree-sitter parsers
//!
//! Tree-sitter parsers are not Send + Sync, so each worker thread owns one
//! parser and receives requests over a shared channel. Callers submit a
//! whole batch before collecting, so files parse concurrently.

use anyhow::Result;
use sprig_core::{FileId, Language};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use tree_sitter::Parser;

/// Pick the grammar for a file. TypeScript files ending in `.tsx` use the
/// TSX dialect; the JavaScript grammar already accepts JSX.
pub fn grammar(language: Language, path: &Path) -> tree_sitter::Language {
    match language {
        Language::C => tree_sitter_c::LANGUAGE.into(),
        Language::CSharp => tree_sitter_c_sharp::LANGUAGE.into(),
        Language::Python => tree_sitter_python::LANGUAGE.into(),
        Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        Language::TypeScript => {
            if path.extension().and_then(|e| e.to_str()) == Some("tsx") {
                tree_sitter_typescript::LANGUAGE_TSX.into()
            } else {
                tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()
            }
        }
    }
}

/// A parsing request sent to the parser pool
#[derive(Debug)]
pub struct ParseRequest {
    pub id: FileId,
    pub language: Language,
    pub content: String,
}

/// Result of a parsing operation
#[derive(Debug)]
pub struct ParseResult {
    pub id: FileId,
    pub language: Language,
    pub tree: tree_sitter::Tree,
    pub content: String,
}

/// A parse that failed, still naming its file.
#[derive(Debug)]
pub struct ParseFailure {
    pub id: FileId,
    pub error: anyhow::Error,
}

type Reply = std::result::Result<ParseResult, ParseFailure>;

/// Internal message for the parser worker
struct WorkerRequest {
    request: ParseRequest,
    response_sender: Sender<Reply>,
}

/// Thread-safe parser pool
#[derive(Clone)]
pub struct ParserPool {
    sender: Sender<WorkerRequest>,
}

impl ParserPool {
    /// Create a new parser pool with the specified number of worker threads
    pub fn new(num_workers: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<WorkerRequest>();
        let receiver = Arc::new(Mutex::new(receiver));

        for i in 0..num_workers.max(1) {
            let receiver = Arc::clone(&receiver);
            std::thread::spawn(move || {
                Self::worker_thread(i, receiver);
            });
        }

        Self { sender }
    }

    /// Worker thread function that processes parsing requests
    fn worker_thread(worker_id: usize, receiver: Arc<Mutex<Receiver<WorkerRequest>>>) {
        tracing::debug!("Parser worker {} started", worker_id);

        let mut parser = Parser::new();

        loop {
            // The guard must drop before parsing so other workers can receive.
            let next = match receiver.lock() {
                Ok(guard) => guard.recv(),
                Err(_) => break,
            };
            let Ok(WorkerRequest {
                request,
                response_sender,
            }) = next
            else {
                break;
            };

            let reply = Self::parse_one(&mut parser, request);
            if response_sender.send(reply).is_err() {
                tracing::warn!("Failed to send parse result back to caller");
            }
        }

        tracing::debug!("Parser worker {} shutting down", worker_id);
    }

    fn parse_one(parser: &mut Parser, request: ParseRequest) -> Reply {
        let ParseRequest {
            id,
            language,
            content,
        } = request;

        let grammar = grammar(language, Path::new(&id));
        if let Err(e) = parser.set_language(&grammar) {
            return Err(ParseFailure {
                id,
                error: anyhow::anyhow!("Failed to set language: {}", e),
            });
        }

        match parser.parse(&content, None) {
            Some(tree) => Ok(ParseResult {
                id,
                language,
                tree,
                content,
            }),
            None => Err(ParseFailure {
                id,
                error: anyhow::anyhow!("Failed to parse content"),
            }),
        }
    }

    /// Queue one request and return the channel its reply arrives on.
    fn submit(&self, request: ParseRequest) -> Result<Receiver<Reply>> {
        let (response_sender, response_receiver) = mpsc::channel();
        self.sender
            .send(WorkerRequest {
                request,
                response_sender,
            })
            .map_err(|_| anyhow::anyhow!("Parser pool is shut down"))?;
        Ok(response_receiver)
    }

    /// Parse content synchronously using the parser pool
    pub fn parse_blocking(&self, request: ParseRequest) -> Result<ParseResult> {
        let receiver = self.submit(request)?;
        match receiver.recv() {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(failure)) => Err(failure.error),
            Err(_) => Err(anyhow::anyhow!("Parser worker died")),
        }
    }

    /// Parse a batch. Every request is queued before any reply is awaited;
    /// replies come back in request order.
    pub fn parse_all(&self, requests: Vec<ParseRequest>) -> Vec<Reply> {
        let pending: Vec<(FileId, Result<Receiver<Reply>>)> = requests
            .into_iter()
            .map(|request| (request.id.clone(), self.submit(request)))
            .collect();

        pending
            .into_iter()
            .map(|(id, receiver)| {
                let receiver = receiver.map_err(|error| ParseFailure {
                    id: id.clone(),
                    error,
                })?;
                receiver.recv().unwrap_or_else(|_| {
                    Err(ParseFailure {
                        id,
                        error: anyhow::anyhow!("Parser worker died"),
                    })
                })
            })
            .collect()
    }
}

/// Convenience function to create a parser pool with default settings
pub fn create_parser_pool() -> ParserPool {
    // Use number of CPU cores as default worker count, but at least 2
    let num_workers = std::thread::available_parallelism()
        .map(|n| n.get().max(2))
        .unwrap_or(2);

    ParserPool::new(num_workers)
}

//! Thread-safe parser pool for tree-sitter parsers
//!
//! Tree-sitter parsers are not Send + Sync, so each worker thread owns one
//! parser and requests reach it over a shared channel.

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tree_sitter::Parser;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("parser pool is shut down")]
    PoolShutDown,

    #[error("parser worker died")]
    WorkerDied,

    #[error("failed to load the Java grammar: {0}")]
    Language(String),

    #[error("parser produced no tree for {0}")]
    NoTree(PathBuf),
}

/// A parsing request sent to the parser pool
#[derive(Debug)]
pub struct ParseRequest {
    pub content: String,
    pub path: PathBuf,
}

/// Result of a parsing operation
#[derive(Debug)]
pub struct ParseResult {
    pub tree: tree_sitter::Tree,
    pub path: PathBuf,
    pub content: String,
}

impl ParseResult {
    /// Whether the tree contains syntax errors.
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

/// Internal message for the parser worker
#[derive(Debug)]
struct WorkerRequest {
    request: ParseRequest,
    response_sender: Sender<Result<ParseResult, IndexError>>,
}

/// Thread-safe pool of Java parsers
pub struct ParserPool {
    sender: Sender<WorkerRequest>,
}

impl ParserPool {
    /// Create a new parser pool with the specified number of worker threads
    pub fn new(num_workers: usize) -> Self {
        let (sender, receiver) = channel::<WorkerRequest>();
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
        let language_error = parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .err()
            .map(|e| e.to_string());

        loop {
            let next = {
                let guard = match receiver.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                guard.recv()
            };
            let WorkerRequest {
                request,
                response_sender,
            } = match next {
                Ok(req) => req,
                Err(_) => {
                    tracing::debug!("Parser worker {} shutting down", worker_id);
                    break;
                }
            };

            let result = match &language_error {
                Some(message) => Err(IndexError::Language(message.clone())),
                None => match parser.parse(&request.content, None) {
                    Some(tree) => Ok(ParseResult {
                        tree,
                        path: request.path,
                        content: request.content,
                    }),
                    None => Err(IndexError::NoTree(request.path)),
                },
            };

            if response_sender.send(result).is_err() {
                tracing::warn!("Failed to send parse result back to caller");
            }
        }
    }

    /// Parse content synchronously using the parser pool
    pub fn parse_blocking(&self, request: ParseRequest) -> Result<ParseResult, IndexError> {
        let (response_sender, response_receiver) = channel();

        self.sender
            .send(WorkerRequest {
                request,
                response_sender,
            })
            .map_err(|_| IndexError::PoolShutDown)?;

        response_receiver.recv().map_err(|_| IndexError::WorkerDied)?
    }

    /// Queue every request before waiting on any, so all workers stay busy.
    /// Results come back in request order.
    pub fn parse_many(&self, requests: Vec<ParseRequest>) -> Vec<Result<ParseResult, IndexError>> {
        let mut pending = Vec::with_capacity(requests.len());
        for request in requests {
            let (response_sender, response_receiver) = channel();
            let sent = self.sender.send(WorkerRequest {
                request,
                response_sender,
            });
            pending.push(sent.map(|_| response_receiver));
        }

        pending
            .into_iter()
            .map(|receiver| match receiver {
                Ok(receiver) => receiver.recv().map_err(|_| IndexError::WorkerDied)?,
                Err(_) => Err(IndexError::PoolShutDown),
            })
            .collect()
    }
}

impl Clone for ParserPool {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
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

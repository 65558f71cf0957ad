#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mugshot_core::{RenderedImage, TransportError};
use mugshot_download::{
    DownloadError, DownloadHandler, DownloadSink, FetchedMedia, LinkOpener, MediaFetcher,
};

pub struct ScriptedFetcher {
    reply: Result<FetchedMedia, TransportError>,
    pub requested: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn ok(content_type: &str, bytes: &[u8]) -> Arc<Self> {
        Self::with(Ok(FetchedMedia {
            status: 200,
            content_type: Some(content_type.to_string()),
            bytes: bytes.to_vec(),
        }))
    }

    pub fn status(status: u16) -> Arc<Self> {
        Self::with(Ok(FetchedMedia {
            status,
            content_type: None,
            bytes: Vec::new(),
        }))
    }

    pub fn blocked() -> Arc<Self> {
        Self::with(Err(TransportError("cors rejected".to_string())))
    }

    fn with(reply: Result<FetchedMedia, TransportError>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            requested: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl MediaFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedMedia, TransportError> {
        self.requested
            .lock()
            .expect("fetch log lock")
            .push(url.to_string());
        self.reply.clone()
    }
}

#[derive(Default)]
pub struct MemorySink {
    pub saved: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved.lock().expect("sink lock").clone()
    }
}

impl DownloadSink for MemorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, DownloadError> {
        self.saved
            .lock()
            .expect("sink lock")
            .push((file_name.to_string(), bytes.to_vec()));
        Ok(PathBuf::from("/downloads").join(file_name))
    }
}

pub struct RecordingOpener {
    pub fail: bool,
    pub opened: Mutex<Vec<String>>,
}

impl RecordingOpener {
    pub fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            fail,
            opened: Mutex::new(Vec::new()),
        })
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("opener lock").clone()
    }
}

impl LinkOpener for RecordingOpener {
    fn open_in_new_tab(&self, url: &str) -> Result<(), DownloadError> {
        self.opened
            .lock()
            .expect("opener lock")
            .push(url.to_string());
        if self.fail {
            Err(DownloadError::Open("no browser".to_string()))
        } else {
            Ok(())
        }
    }
}

pub fn handler(
    fetcher: Arc<ScriptedFetcher>,
    sink: Arc<MemorySink>,
    opener: Arc<RecordingOpener>,
) -> DownloadHandler {
    DownloadHandler::new(fetcher, sink, opener)
}

pub fn red_square() -> RenderedImage {
    RenderedImage {
        width: 2,
        height: 2,
        rgba: [255, 0, 0, 255].repeat(4),
    }
}

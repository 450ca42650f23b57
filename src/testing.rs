//! In-memory stand-ins for the network capabilities.

use std::cell::{Cell, RefCell};

use crate::error::{Error, Result};
use crate::fetch::PageFetcher;
use crate::translate::Translator;

pub struct FakeFetcher {
    page: String,
    bytes: Option<Vec<u8>>,
    page_calls: Cell<usize>,
    byte_calls: Cell<usize>,
}

impl FakeFetcher {
    pub fn new(page: &str) -> Self {
        FakeFetcher {
            page: page.to_string(),
            bytes: None,
            page_calls: Cell::new(0),
            byte_calls: Cell::new(0),
        }
    }

    pub fn with_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.bytes = Some(bytes);
        self
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.get()
    }

    pub fn byte_calls(&self) -> usize {
        self.byte_calls.get()
    }
}

impl PageFetcher for FakeFetcher {
    async fn fetch_page(&self, _url: &str) -> Result<String> {
        self.page_calls.set(self.page_calls.get() + 1);
        Ok(self.page.clone())
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.byte_calls.set(self.byte_calls.get() + 1);
        self.bytes.clone().ok_or_else(|| Error::Response {
            service: "fake",
            details: format!("no bytes for {}", url),
        })
    }
}

/// Prefixes every text with `ZH:`; texts containing `FAIL` error out.
#[derive(Default)]
pub struct ScriptedTranslator {
    pub seen: RefCell<Vec<String>>,
}

impl ScriptedTranslator {
    pub fn calls(&self) -> usize {
        self.seen.borrow().len()
    }
}

impl Translator for ScriptedTranslator {
    async fn translate(&self, text: &str) -> Result<String> {
        self.seen.borrow_mut().push(text.to_string());
        if text.contains("FAIL") {
            return Err(Error::Response {
                service: "fake",
                details: "scripted failure".into(),
            });
        }
        Ok(format!("ZH:{}", text))
    }
}

//! System clipboard using arboard

use anyhow::anyhow;

/// Lazily opened system clipboard
///
/// Opening fails on headless machines, so the handle is only created on
/// the first copy and the error surfaces there.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self { inner: None }
    }

    fn ensure(&mut self) -> crate::Result<&mut arboard::Clipboard> {
        if self.inner.is_none() {
            let clipboard =
                arboard::Clipboard::new().map_err(|e| anyhow!("clipboard unavailable: {}", e))?;
            self.inner = Some(clipboard);
        }
        self.inner
            .as_mut()
            .ok_or_else(|| anyhow!("clipboard unavailable"))
    }

    pub fn set(&mut self, contents: &str) -> crate::Result<()> {
        let clipboard = self.ensure()?;
        clipboard
            .set_text(contents.to_string())
            .map_err(|e| anyhow!("clipboard error: {}", e))
    }
}

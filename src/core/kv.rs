use std::collections::HashMap;
use std::sync::Mutex;

/// Text key-value backend behind the store layer.
///
/// The Spin component uses the host's default store; the native binary and
/// the tests use [`MemoryStore`].
pub trait KeyValue {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn delete(&self, key: &str) -> anyhow::Result<()>;
}

impl KeyValue for spin_sdk::key_value::Store {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        match spin_sdk::key_value::Store::get(self, key)? {
            Some(bytes) => Ok(Some(String::from_utf8(bytes)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        spin_sdk::key_value::Store::set(self, key, value.as_bytes())?;
        Ok(())
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        spin_sdk::key_value::Store::delete(self, key)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> anyhow::Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))
    }
}

impl KeyValue for MemoryStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

//! 会话文件存储
//!
//! 以不透明标识符为键的临时文件登记表。存储抽象为 trait 注入，
//! 而不是进程级全局映射；`put`/`delete` 与并发 `get` 之间由内部
//! 互斥锁串行化，防止查找到的路径在使用前被删除条目清掉。

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{Result, UnredactorError};

/// 会话存储接口
pub trait SessionStore: Send + Sync {
    /// 保存一段字节，返回不透明标识符
    fn put(&self, bytes: &[u8]) -> Result<String>;

    /// 标识符对应的文件路径
    fn get(&self, id: &str) -> Result<PathBuf>;

    /// 删除条目及其文件
    fn delete(&self, id: &str) -> Result<()>;
}

/// 基于临时目录的会话存储
///
/// 条目生命周期：`put` 创建，`delete` 显式清理，或随存储本身
/// drop 时整体清理。
pub struct TempFileStore {
    dir: PathBuf,
    entries: Mutex<HashMap<String, PathBuf>>,
}

impl TempFileStore {
    /// 在系统临时目录下建立独立的存储目录
    pub fn new() -> Result<Self> {
        let dir = std::env::temp_dir().join(format!(
            "unredactor_{}_{}",
            std::process::id(),
            uuid::Uuid::new_v4().simple()
        ));
        Self::at(dir)
    }

    /// 使用指定目录作为存储根
    pub fn at(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            entries: Mutex::new(HashMap::new()),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, PathBuf>> {
        // 锁只包裹对 map 的短操作，不会在持锁状态下 panic
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for TempFileStore {
    fn put(&self, bytes: &[u8]) -> Result<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let path = self.dir.join(format!("{id}.pdf"));
        std::fs::write(&path, bytes)?;
        self.lock().insert(id.clone(), path);
        log::info!("[Session] 新条目 {}（{} 字节）", id, bytes.len());
        Ok(id)
    }

    fn get(&self, id: &str) -> Result<PathBuf> {
        self.lock()
            .get(id)
            .cloned()
            .ok_or_else(|| UnredactorError::FileNotFound(id.to_string()))
    }

    fn delete(&self, id: &str) -> Result<()> {
        let path = self
            .lock()
            .remove(id)
            .ok_or_else(|| UnredactorError::FileNotFound(id.to_string()))?;
        if let Err(e) = std::fs::remove_file(&path) {
            log::warn!("[Session] 删除文件 {:?} 失败: {}", path, e);
        }
        log::info!("[Session] 条目 {} 已删除", id);
        Ok(())
    }
}

impl Drop for TempFileStore {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            log::warn!("[Session] 清理存储目录 {:?} 失败: {}", self.dir, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, TempFileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TempFileStore::at(dir.path().join("sessions")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_put_get_delete_lifecycle() {
        let (_dir, store) = store();
        let id = store.put(b"%PDF-1.7 test").unwrap();

        let path = store.get(&id).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7 test");

        store.delete(&id).unwrap();
        assert!(matches!(
            store.get(&id),
            Err(UnredactorError::FileNotFound(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_ids_are_opaque_and_distinct() {
        let (_dir, store) = store();
        let a = store.put(b"%PDF a").unwrap();
        let b = store.put(b"%PDF a").unwrap();
        assert_ne!(a, b);
        assert!(a.len() >= 32);
    }

    #[test]
    fn test_missing_id() {
        let (_dir, store) = store();
        assert!(matches!(
            store.get("nope"),
            Err(UnredactorError::FileNotFound(_))
        ));
        assert!(matches!(
            store.delete("nope"),
            Err(UnredactorError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_drop_cleans_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("sessions");
        let store = TempFileStore::at(root.clone()).unwrap();
        store.put(b"%PDF x").unwrap();
        assert!(root.exists());
        drop(store);
        assert!(!root.exists());
    }
}

//! File Storage - 文件系统音频存储实现
//!
//! 实现 AudioStoragePort trait

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::application::ports::{AudioKind, AudioStorageError, AudioStoragePort};

/// 文件系统音频存储
pub struct FileAudioStorage {
    /// 存储根目录（已规范化）
    base_dir: PathBuf,
}

impl FileAudioStorage {
    /// 创建存储并确保 chunks/ chapters/ book/ 存在
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self, AudioStorageError> {
        let base_dir = base_dir.as_ref();

        for kind in AudioKind::ALL {
            fs::create_dir_all(base_dir.join(kind.dir_name()))
                .await
                .map_err(|e| AudioStorageError::IoError(e.to_string()))?;
        }

        let base_dir = fs::canonicalize(base_dir)
            .await
            .map_err(|e| AudioStorageError::IoError(e.to_string()))?;

        Ok(Self { base_dir })
    }
}

fn io_err(e: std::io::Error) -> AudioStorageError {
    AudioStorageError::IoError(e.to_string())
}

/// `{path}.part`
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

#[async_trait]
impl AudioStoragePort for FileAudioStorage {
    fn root(&self) -> &Path {
        &self.base_dir
    }

    fn scratch_path(&self, target: &Path) -> PathBuf {
        let stem = target
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match target.extension() {
            Some(ext) => format!("{}_normalized.{}", stem, ext.to_string_lossy()),
            None => format!("{}_normalized", stem),
        };
        target.with_file_name(name)
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    /// 先写入 .part 再重命名，中途失败不会留下可被当作缓存命中的半成品
    async fn write(&self, path: &Path, data: &[u8]) -> Result<(), AudioStorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let partial = partial_path(path);
        fs::write(&partial, data).await.map_err(io_err)?;
        fs::rename(&partial, path).await.map_err(io_err)?;

        tracing::debug!(path = %path.display(), size = data.len(), "Saved audio");
        Ok(())
    }

    async fn replace(&self, source: &Path, target: &Path) -> Result<(), AudioStorageError> {
        if !fs::try_exists(source).await.unwrap_or(false) {
            return Err(AudioStorageError::FileNotFound(
                source.to_string_lossy().to_string(),
            ));
        }

        match fs::remove_file(target).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_err(e)),
        }
        fs::rename(source, target).await.map_err(io_err)?;

        tracing::debug!(
            source = %source.display(),
            target = %target.display(),
            "Audio file replaced"
        );
        Ok(())
    }

    async fn resolve(&self, relative: &str) -> Result<PathBuf, AudioStorageError> {
        let relative_path = Path::new(relative);
        let only_normal = relative_path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if relative.is_empty() || !only_normal {
            return Err(AudioStorageError::InvalidPath(relative.to_string()));
        }

        let candidate = self.base_dir.join(relative_path);
        let resolved = match fs::canonicalize(&candidate).await {
            Ok(path) => path,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AudioStorageError::FileNotFound(relative.to_string()))
            }
            Err(e) => return Err(io_err(e)),
        };

        // 符号链接等可能指向根目录之外
        if !resolved.starts_with(&self.base_dir) {
            return Err(AudioStorageError::InvalidPath(relative.to_string()));
        }

        let metadata = fs::metadata(&resolved).await.map_err(io_err)?;
        if !metadata.is_file() {
            return Err(AudioStorageError::FileNotFound(relative.to_string()));
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_layout_and_urls() {
        let dir = TempDir::new().unwrap();
        let storage = FileAudioStorage::new(dir.path()).await.unwrap();

        for kind in AudioKind::ALL {
            assert!(storage.root().join(kind.dir_name()).is_dir());
        }

        let path = storage.path_for(AudioKind::Chapter, "p_ch0.mp3");
        assert!(path.ends_with("chapters/p_ch0.mp3"));
        assert_eq!(
            storage.url_for(AudioKind::Book, "p_audiobook.mp3"),
            "/audio/book/p_audiobook.mp3"
        );
        assert!(storage
            .scratch_path(&path)
            .ends_with("chapters/p_ch0_normalized.mp3"));
    }

    #[tokio::test]
    async fn test_write_exists_replace() {
        let dir = TempDir::new().unwrap();
        let storage = FileAudioStorage::new(dir.path()).await.unwrap();

        let target = storage.path_for(AudioKind::Chapter, "c.mp3");
        let scratch = storage.scratch_path(&target);
        assert!(!storage.exists(&target).await);

        storage.write(&target, b"old").await.unwrap();
        storage.write(&scratch, b"new").await.unwrap();
        assert!(storage.exists(&target).await);
        assert!(!partial_path(&target).exists());

        storage.replace(&scratch, &target).await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"new");
        assert!(!storage.exists(&scratch).await);

        assert!(matches!(
            storage.replace(&scratch, &target).await,
            Err(AudioStorageError::FileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("output");
        let storage = FileAudioStorage::new(&root).await.unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"secret").unwrap();

        let chapter = storage.path_for(AudioKind::Chapter, "ok.mp3");
        storage.write(&chapter, b"audio").await.unwrap();

        assert!(storage.resolve("chapters/ok.mp3").await.is_ok());
        assert!(matches!(
            storage.resolve("../secret.txt").await,
            Err(AudioStorageError::InvalidPath(_))
        ));
        assert!(matches!(
            storage.resolve("chapters/../../secret.txt").await,
            Err(AudioStorageError::InvalidPath(_))
        ));
        assert!(matches!(
            storage.resolve("/etc/passwd").await,
            Err(AudioStorageError::InvalidPath(_))
        ));
        assert!(matches!(
            storage.resolve("chapters/missing.mp3").await,
            Err(AudioStorageError::FileNotFound(_))
        ));
        assert!(matches!(
            storage.resolve("chapters").await,
            Err(AudioStorageError::FileNotFound(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_rejects_symlink_escape() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("output");
        let storage = FileAudioStorage::new(&root).await.unwrap();
        let outside = dir.path().join("outside.mp3");
        std::fs::write(&outside, b"x").unwrap();
        std::os::unix::fs::symlink(&outside, root.join("book").join("link.mp3")).unwrap();

        assert!(matches!(
            storage.resolve("book/link.mp3").await,
            Err(AudioStorageError::InvalidPath(_))
        ));
    }
}

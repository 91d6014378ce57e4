// src/services/storage_service.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::common::error::AppError;

// Resultado de um upload: o binário fica no provedor, aqui só os metadados.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub url: String,
    pub storage_key: String,
    pub provider: String,
    pub size: i64,
}

// Porta de armazenamento de arquivos. O provedor concreto é decidido
// na subida; os serviços só conhecem esta interface.
#[async_trait]
pub trait StoragePort: Send + Sync {
    async fn store(
        &self,
        bytes: &[u8],
        file_name: &str,
        mime_type: &str,
    ) -> Result<StoredObject, AppError>;
}

// Provedor em disco local, para desenvolvimento e instalações pequenas.
#[derive(Debug, Clone)]
pub struct DiskStorage {
    base_dir: std::path::PathBuf,
    public_base_url: String,
}

impl DiskStorage {
    pub fn new(base_dir: impl Into<std::path::PathBuf>, public_base_url: String) -> Self {
        Self {
            base_dir: base_dir.into(),
            public_base_url,
        }
    }
}

#[async_trait]
impl StoragePort for DiskStorage {
    async fn store(
        &self,
        bytes: &[u8],
        file_name: &str,
        _mime_type: &str,
    ) -> Result<StoredObject, AppError> {
        // A chave leva um UUID na frente para nunca colidir com outro upload.
        let safe_name: String = file_name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect();
        let storage_key = format!("{}-{}", Uuid::new_v4(), safe_name);

        tokio::fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|e| anyhow::anyhow!("Falha ao criar diretório de uploads: {}", e))?;
        let path = self.base_dir.join(&storage_key);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| anyhow::anyhow!("Falha ao gravar upload: {}", e))?;

        Ok(StoredObject {
            url: format!("{}/{}", self.public_base_url.trim_end_matches('/'), storage_key),
            storage_key,
            provider: "disk".to_string(),
            size: bytes.len() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disk_storage_round_trip() {
        let dir = std::env::temp_dir().join(format!("uploads-test-{}", Uuid::new_v4()));
        let storage = DiskStorage::new(&dir, "http://localhost:3000/uploads".to_string());

        let stored = storage
            .store(b"conteudo", "laudo rc.pdf", "application/pdf")
            .await
            .unwrap();

        assert_eq!(stored.provider, "disk");
        assert_eq!(stored.size, 8);
        assert!(stored.storage_key.ends_with("laudo_rc.pdf"));

        let on_disk = tokio::fs::read(dir.join(&stored.storage_key)).await.unwrap();
        assert_eq!(on_disk, b"conteudo");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}

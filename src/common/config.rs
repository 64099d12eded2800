use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Configuración de navegación de colecciones
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// Elementos por página solicitados al servicio
    pub page_size: usize,
    /// Máximo de consultas de metadatos al crear entradas de papelera
    pub metadata_lookup_limit: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            page_size: 50,
            metadata_lookup_limit: 25,
        }
    }
}

/// Configuración de la papelera local
#[derive(Debug, Clone)]
pub struct TrashConfig {
    /// Capacidad por defecto si no hay un límite persistido
    pub default_limit: usize,
    /// Directorio donde se guardan las claves de la papelera
    pub storage_dir: PathBuf,
}

impl Default for TrashConfig {
    fn default() -> Self {
        Self {
            default_limit: 100,
            storage_dir: PathBuf::from("./storage/trash"),
        }
    }
}

/// Configuración de timeouts para diferentes operaciones
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Timeout para llamadas al servicio de colecciones (ms)
    pub network_operation_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            network_operation_ms: 15000, // 15 segundos
        }
    }
}

impl TimeoutConfig {
    /// Obtiene un Duration para operaciones de red
    pub fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_operation_ms)
    }
}

/// Configuración del servicio remoto
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// URL base del servicio de colecciones
    pub base_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
        }
    }
}

/// Configuración global de la aplicación
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub collection: CollectionConfig,
    pub trash: TrashConfig,
    pub timeouts: TimeoutConfig,
    pub service: ServiceConfig,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno GALLERIST_*
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(v) = env_parse("GALLERIST_PAGE_SIZE") {
            config.collection.page_size = v;
        }
        if let Some(v) = env_parse("GALLERIST_METADATA_LOOKUP_LIMIT") {
            config.collection.metadata_lookup_limit = v;
        }
        if let Some(v) = env_parse("GALLERIST_TRASH_LIMIT") {
            config.trash.default_limit = v;
        }
        if let Ok(dir) = std::env::var("GALLERIST_TRASH_DIR") {
            config.trash.storage_dir = PathBuf::from(dir);
        }
        if let Some(v) = env_parse("GALLERIST_NETWORK_TIMEOUT_MS") {
            config.timeouts.network_operation_ms = v;
        }
        if let Ok(url) = std::env::var("GALLERIST_SERVICE_URL") {
            config.service.base_url = url.trim_end_matches('/').to_string();
        }

        // Un tamaño de página de 0 nunca avanzaría
        config.collection.page_size = config.collection.page_size.max(1);

        config
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparsable value for {}: {:?}", name, raw);
            None
        }
    }
}

use std::path::PathBuf;

/// Failure to read one of the grove's model files.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse OBJ {}: {source}", path.display())]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("model {} contains no triangles", .0.display())]
    EmptyModel(PathBuf),
}

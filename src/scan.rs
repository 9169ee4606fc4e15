use std::{fs, io::ErrorKind, path::Path};

use crate::{format_address, Network, NetworkName, NetworkRegistry, Result, NATIVE_TOKEN_ADDRESS};

const LOGO_EXTENSION: &str = "png";

/// Logos found in one `images/<folder>` directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderScan {
    pub folder: String,
    /// Registry network owning this folder, if any.
    pub network: Option<NetworkName>,
    /// Lowercased token addresses taken from logo file names, sorted.
    pub addresses: Vec<String>,
    /// Files that are not logos.
    pub stray_files: Vec<String>,
    pub has_native_image: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ImageScan {
    pub folders: Vec<FolderScan>,
}

impl ImageScan {
    pub fn folder(&self, folder: &str) -> Option<&FolderScan> {
        self.folders.iter().find(|scan| scan.folder == folder)
    }

    pub fn for_network(&self, network: &Network) -> Option<&FolderScan> {
        self.folder(&network.folder_name)
    }

    pub fn log_summary(&self) {
        tracing::info!(folders = self.folders.len(), "Token list generation summary");
        for scan in &self.folders {
            tracing::info!(
                folder = %scan.folder,
                network = scan.network.as_deref().unwrap_or("-"),
                tokens = scan.addresses.len(),
                errors = scan.stray_files.len(),
                native = scan.has_native_image,
                "Scanned logos"
            );
        }
    }
}

/// Scans `root/<folder>/<address>.png`. The native-token sentinel's logo is
/// noted in `has_native_image` and kept out of `addresses`.
pub fn scan_images(root: &Path, registry: &NetworkRegistry) -> Result<ImageScan> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::warn!(path = %root.display(), "Images directory not found");
            return Ok(ImageScan::default());
        }
        Err(e) => return Err(e.into()),
    };

    let native = format_address(&NATIVE_TOKEN_ADDRESS);
    let mut folders = Vec::new();

    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let folder = entry.file_name().to_string_lossy().into_owned();
        let mut scan = FolderScan {
            network: registry.lookup_by_folder(&folder).map(|network| network.name.clone()),
            folder,
            ..FolderScan::default()
        };

        for file in fs::read_dir(entry.path())? {
            let file = file?;
            if !file.file_type()?.is_file() {
                continue;
            }
            let path = file.path();
            let file_name = file.file_name().to_string_lossy().into_owned();
            let is_logo = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(LOGO_EXTENSION));

            match path.file_stem().map(|stem| stem.to_string_lossy().to_lowercase()) {
                Some(address) if is_logo && address == native => scan.has_native_image = true,
                Some(address) if is_logo => scan.addresses.push(address),
                _ => scan.stray_files.push(file_name),
            }
        }

        scan.addresses.sort();
        scan.addresses.dedup();
        scan.stray_files.sort();
        folders.push(scan);
    }

    folders.sort_by(|a, b| a.folder.cmp(&b.folder));
    Ok(ImageScan { folders })
}

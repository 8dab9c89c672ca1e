//! ffmpeg binary provisioning.
//!
//! Ensures a local ffmpeg/ffprobe/ffplay installation exists under a
//! destination directory, downloading and unpacking the platform's static
//! build package when absent. The analyzer consumes the resolved ffprobe
//! path; a failed provision therefore surfaces downstream the same way as
//! a missing tool.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};

use crate::error::{CoreError, CoreResult};

/// ffmpeg release the default provisioner fetches.
pub const DEFAULT_FFMPEG_VERSION: &str = "4.1.3";

const DEFAULT_BASE_URL: &str = "https://ffmpeg.zeranoe.com/builds";

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Paths of the unpacked tool binaries. All three are verified to exist
/// before a provision call reports success.
#[derive(Debug, Clone)]
pub struct ProvisionedTools {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub ffplay_path: PathBuf,
}

/// Downloads and unpacks a platform-specific static ffmpeg build.
#[derive(Debug, Clone)]
pub struct FfmpegProvisioner {
    version: String,
    base_url: String,
}

impl Default for FfmpegProvisioner {
    fn default() -> Self {
        Self::new(DEFAULT_FFMPEG_VERSION)
    }
}

impl FfmpegProvisioner {
    /// Creates a provisioner for the given ffmpeg release.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Overrides the build archive base URL (useful for mirrors and tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The package URL for the current platform.
    pub fn package_url(&self) -> CoreResult<String> {
        let platform = current_platform_tag()?;
        Ok(self.url_for(platform))
    }

    /// Ensures the tools exist under `dest_dir`, downloading and unpacking
    /// the build package if necessary.
    ///
    /// `progress` receives `(bytes_downloaded, total_bytes)` as the archive
    /// streams in; it is not called when the package is already unpacked.
    pub fn provision(
        &self,
        dest_dir: &Path,
        progress: impl FnMut(u64, Option<u64>),
    ) -> CoreResult<ProvisionedTools> {
        let platform = current_platform_tag()?;
        let package = self.package_name(platform);
        let bin_dir = dest_dir.join(&package).join("bin");

        // Already unpacked from an earlier run.
        if bin_dir.is_dir() {
            debug!("Reusing unpacked ffmpeg package at {}", bin_dir.display());
            return resolve_tools(&bin_dir);
        }

        fs::create_dir_all(dest_dir)?;

        let url = self.url_for(platform);
        let archive_path = dest_dir.join(format!("{package}.zip"));
        info!("Downloading {url}");
        download_to_file(&url, &archive_path, progress)?;

        unpack_archive(&archive_path, dest_dir)?;
        fs::remove_file(&archive_path)?;

        resolve_tools(&bin_dir)
    }

    fn package_name(&self, platform: &str) -> String {
        format!("ffmpeg-{}-{}-static", self.version, platform)
    }

    fn url_for(&self, platform: &str) -> String {
        format!(
            "{}/{}/static/{}.zip",
            self.base_url,
            platform,
            self.package_name(platform)
        )
    }
}

/// Build-archive tag for the current platform. Only platforms with
/// published static zip builds are supported.
fn current_platform_tag() -> CoreResult<&'static str> {
    platform_tag(std::env::consts::OS, std::env::consts::ARCH)
}

fn platform_tag(os: &str, arch: &str) -> CoreResult<&'static str> {
    match (os, arch) {
        ("windows", "x86_64") => Ok("win64"),
        ("windows", _) => Ok("win32"),
        ("macos", _) => Ok("macos64"),
        (other, _) => Err(CoreError::UnsupportedPlatform(other.to_string())),
    }
}

fn download_to_file(
    url: &str,
    dest: &Path,
    mut progress: impl FnMut(u64, Option<u64>),
) -> CoreResult<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()?;
    let mut response = client.get(url).send()?;
    if !response.status().is_success() {
        return Err(CoreError::Download(format!(
            "{url} returned {}",
            response.status()
        )));
    }

    let total = response.content_length();
    let mut out = File::create(dest)?;
    let mut buf = [0u8; 64 * 1024];
    let mut written = 0u64;
    loop {
        let n = response.read(&mut buf)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
        written += n as u64;
        progress(written, total);
    }
    out.flush()?;
    Ok(())
}

fn unpack_archive(archive_path: &Path, dest_dir: &Path) -> CoreResult<()> {
    debug!("Unpacking {} into {}", archive_path.display(), dest_dir.display());
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    archive.extract(dest_dir)?;
    Ok(())
}

fn resolve_tools(bin_dir: &Path) -> CoreResult<ProvisionedTools> {
    let suffix = if cfg!(windows) { ".exe" } else { "" };
    let tools = ProvisionedTools {
        ffmpeg_path: bin_dir.join(format!("ffmpeg{suffix}")),
        ffprobe_path: bin_dir.join(format!("ffprobe{suffix}")),
        ffplay_path: bin_dir.join(format!("ffplay{suffix}")),
    };
    if tools.ffmpeg_path.is_file() && tools.ffprobe_path.is_file() && tools.ffplay_path.is_file() {
        Ok(tools)
    } else {
        Err(CoreError::Download(format!(
            "package at {} is missing expected binaries",
            bin_dir.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_tags() {
        assert_eq!(platform_tag("windows", "x86_64").unwrap(), "win64");
        assert_eq!(platform_tag("windows", "x86").unwrap(), "win32");
        assert_eq!(platform_tag("macos", "aarch64").unwrap(), "macos64");
        assert!(matches!(
            platform_tag("linux", "x86_64"),
            Err(CoreError::UnsupportedPlatform(_))
        ));
    }

    #[test]
    fn package_urls() {
        let provisioner = FfmpegProvisioner::new("4.1.3");
        assert_eq!(
            provisioner.url_for("win64"),
            "https://ffmpeg.zeranoe.com/builds/win64/static/ffmpeg-4.1.3-win64-static.zip"
        );
        let mirrored = FfmpegProvisioner::new("4.1.3").with_base_url("http://localhost:8080/builds");
        assert_eq!(
            mirrored.url_for("macos64"),
            "http://localhost:8080/builds/macos64/static/ffmpeg-4.1.3-macos64-static.zip"
        );
    }

    #[test]
    fn unpack_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("pkg.zip");

        // Build a minimal package archive in place.
        let file = File::create(&archive_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for tool in ["ffmpeg", "ffprobe", "ffplay"] {
            writer
                .start_file(format!("pkg/bin/{tool}"), options)
                .unwrap();
            writer.write_all(b"binary").unwrap();
        }
        writer.finish().unwrap();

        unpack_archive(&archive_path, dir.path()).unwrap();
        let tools = resolve_tools(&dir.path().join("pkg").join("bin")).unwrap();
        assert!(tools.ffprobe_path.is_file());
    }

    #[test]
    fn incomplete_package_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let bin_dir = dir.path().join("bin");
        fs::create_dir_all(&bin_dir).unwrap();
        // Only ffmpeg present, no ffprobe/ffplay.
        File::create(bin_dir.join("ffmpeg")).unwrap();
        assert!(matches!(
            resolve_tools(&bin_dir),
            Err(CoreError::Download(_))
        ));
    }
}

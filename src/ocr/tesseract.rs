//! Tesseract OCR 引擎实现（CLI 包装）

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::ocr::{OcrEngine, OcrError};

/// Tesseract 配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct TesseractConfig {
    /// tesseract 可执行文件路径，缺省时使用 PATH 中的 `tesseract`
    pub binary_path: Option<String>,
    /// 识别语言，缺省 `eng`
    pub lang: Option<String>,
    /// 页面分割模式，缺省 6（单一均匀文本块）
    pub psm: Option<u32>,
    /// tessdata 目录（设置 TESSDATA_PREFIX）
    pub tessdata_path: Option<String>,
    /// 单次识别超时秒数，None 表示不限制
    pub timeout_secs: Option<u64>,
}

impl TesseractConfig {
    /// 读取默认配置并应用环境变量覆盖
    ///
    /// 支持 `UNREDACTOR_TESSERACT_PATH`、`UNREDACTOR_OCR_LANG`、
    /// `UNREDACTOR_OCR_TIMEOUT_SECS`。
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("UNREDACTOR_TESSERACT_PATH") {
            config.binary_path = Some(path);
        }
        if let Ok(lang) = std::env::var("UNREDACTOR_OCR_LANG") {
            config.lang = Some(lang);
        }
        if let Some(secs) = std::env::var("UNREDACTOR_OCR_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout_secs = Some(secs);
        }
        config
    }

    fn binary_or_default(&self) -> &str {
        self.binary_path.as_deref().unwrap_or("tesseract")
    }

    fn lang_or_default(&self) -> &str {
        self.lang.as_deref().unwrap_or("eng")
    }

    fn psm_or_default(&self) -> u32 {
        self.psm.unwrap_or(6)
    }
}

/// Tesseract OCR 引擎
pub struct TesseractEngine {
    config: TesseractConfig,
    version: String,
}

impl TesseractEngine {
    /// 创建引擎，校验二进制可用
    pub fn new(config: TesseractConfig) -> Result<Self, OcrError> {
        let version = get_tesseract_version(config.binary_or_default())?;
        log::info!("[Tesseract] 初始化成功，版本: {}", version);
        Ok(Self { config, version })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    fn recognize_file(&self, image_path: &str) -> Result<String, OcrError> {
        let start = Instant::now();

        let mut cmd = Command::new(self.config.binary_or_default());
        cmd.arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(self.config.lang_or_default())
            .arg("--psm")
            .arg(self.config.psm_or_default().to_string())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(tessdata) = &self.config.tessdata_path {
            cmd.env("TESSDATA_PREFIX", tessdata);
        }

        log::debug!(
            "[Tesseract] 执行: {} {} stdout -l {} --psm {}",
            self.config.binary_or_default(),
            image_path,
            self.config.lang_or_default(),
            self.config.psm_or_default()
        );

        let mut child = cmd
            .spawn()
            .map_err(|e| OcrError::Unavailable(format!("spawn tesseract: {e}")))?;

        // 输出超过管道缓冲时子进程会阻塞在写端，等待前必须先排空管道
        let stdout_thread = child.stdout.take().map(|mut out| {
            std::thread::spawn(move || {
                let mut buf = String::new();
                let _ = out.read_to_string(&mut buf);
                buf
            })
        });
        let stderr_thread = child.stderr.take().map(|mut err| {
            std::thread::spawn(move || {
                let mut buf = String::new();
                let _ = err.read_to_string(&mut buf);
                buf
            })
        });

        // 轮询等待，超过配置时限则终止子进程
        let status = if let Some(secs) = self.config.timeout_secs {
            let deadline = Duration::from_secs(secs);
            loop {
                if let Some(status) = child.try_wait()? {
                    break status;
                }
                if start.elapsed() > deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(OcrError::Timeout(secs));
                }
                std::thread::sleep(Duration::from_millis(50));
            }
        } else {
            child.wait()?
        };

        let stdout = stdout_thread
            .map(|h| h.join().unwrap_or_default())
            .unwrap_or_default();

        if !status.success() {
            let stderr = stderr_thread
                .map(|h| h.join().unwrap_or_default())
                .unwrap_or_default();
            return Err(OcrError::Recognition(format!(
                "tesseract exited with {status}: {}",
                stderr.trim()
            )));
        }

        log::info!(
            "[Tesseract] 识别完成，耗时: {} ms，输出 {} 字符",
            start.elapsed().as_millis(),
            stdout.len()
        );

        Ok(stdout)
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize_image(&mut self, img: &DynamicImage) -> Result<String, OcrError> {
        // tesseract CLI 只接受文件输入，经由临时 PNG 中转
        let temp_input = std::env::temp_dir().join(format!(
            "unredactor_ocr_{}_{}.png",
            std::process::id(),
            uuid::Uuid::new_v4().simple()
        ));

        img.save(&temp_input)?;
        let result = self.recognize_file(temp_input.to_string_lossy().as_ref());

        if let Err(e) = std::fs::remove_file(&temp_input) {
            log::warn!("[Tesseract] 删除临时文件失败: {}", e);
        }

        result
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

/// 获取 tesseract 版本号
fn get_tesseract_version(binary: &str) -> Result<String, OcrError> {
    let output = Command::new(binary)
        .arg("--version")
        .output()
        .map_err(|e| OcrError::Unavailable(format!("{binary}: {e}")))?;

    if !output.status.success() {
        return Err(OcrError::Unavailable(format!(
            "{binary} --version exited with {}",
            output.status
        )));
    }

    // 第一行形如 "tesseract 5.3.4"
    let stdout = String::from_utf8_lossy(&output.stdout);
    let version = stdout
        .lines()
        .next()
        .and_then(|l| l.split_whitespace().nth(1))
        .unwrap_or("unknown")
        .to_string();

    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = TesseractConfig::default();
        assert_eq!(config.binary_or_default(), "tesseract");
        assert_eq!(config.lang_or_default(), "eng");
        assert_eq!(config.psm_or_default(), 6);
        assert_eq!(config.timeout_secs, None);
    }

    #[test]
    #[cfg(unix)]
    fn test_large_output_within_timeout() {
        use std::os::unix::fs::PermissionsExt;

        // 伪造的 tesseract：瞬间输出 1 MiB 后正常退出。
        // 输出远超管道缓冲，排空不及时会把健康的子进程等成超时。
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-tesseract.sh");
        std::fs::write(
            &script,
            "#!/bin/sh\n\
             if [ \"$1\" = \"--version\" ]; then echo 'tesseract 5.0.0'; exit 0; fi\n\
             head -c 1048576 /dev/zero | tr '\\0' 'a'\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = TesseractConfig {
            binary_path: Some(script.to_string_lossy().into_owned()),
            timeout_secs: Some(3),
            ..Default::default()
        };
        let engine = TesseractEngine::new(config).unwrap();
        let start = Instant::now();
        let text = engine.recognize_file("unused.png").unwrap();
        assert_eq!(text.len(), 1048576);
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let config = TesseractConfig {
            binary_path: Some("/nonexistent/tesseract-binary".to_string()),
            ..Default::default()
        };
        match TesseractEngine::new(config) {
            Err(OcrError::Unavailable(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("engine should not initialize"),
        }
    }
}

//! 观测值输入源
//!
//! 外部检测器每帧写一行文本，格式见 [`parse_line`]。输入可以是标准输入或文件。

use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::time::{Interval, MissedTickBehavior};

use crate::blink::signal::{binocular_ear, eye_area_ratio, landmarks_from_coords, BoxSize};
use crate::blink::Observation;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to open observation source {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read observation source: {0}")]
    Read(#[from] std::io::Error),
}

/// 一行输入对应的帧
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// 有效观测值
    Observed(Observation),
    /// 本帧没有检测到可用的面部
    Missing,
    /// 无法解析的行，按缺失帧处理
    Invalid { line: u64, reason: String },
}

impl Frame {
    pub fn observation(&self) -> Option<Observation> {
        match self {
            Frame::Observed(observation) => Some(*observation),
            Frame::Missing | Frame::Invalid { .. } => None,
        }
    }
}

/// 解析单行输入
///
/// - `eyes <n>`: 检测到的眼睛数量
/// - `ear <v>` / `ratio <v>`: 已算好的比值
/// - `landmarks <24 个数>`: 左眼 6 点 + 右眼 6 点，计算双眼平均 EAR
/// - `rects <face_w> <face_h> [<eye_w> <eye_h>]...`: 计算眼部面积比
/// - `none` / `-`: 缺失帧
///
/// 空行与 `#` 注释不算帧，返回 `Ok(None)`。
pub fn parse_line(raw: &str) -> Result<Option<Frame>, String> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut tokens = line.split_whitespace();
    let keyword = tokens.next().unwrap_or_default().to_ascii_lowercase();
    let args: Vec<&str> = tokens.collect();

    let frame = match keyword.as_str() {
        "none" | "-" => Frame::Missing,
        "eyes" => {
            let [count] = args.as_slice() else {
                return Err(format!("eyes expects 1 value, got {}", args.len()));
            };
            let count = count
                .parse::<u32>()
                .map_err(|e| format!("invalid eye count {count:?}: {e}"))?;
            Frame::Observed(Observation::EyeCount(count))
        }
        "ear" | "ratio" => {
            let [value] = args.as_slice() else {
                return Err(format!("{keyword} expects 1 value, got {}", args.len()));
            };
            Frame::Observed(Observation::AspectRatio(parse_number(value)?))
        }
        "landmarks" => {
            let coords = parse_numbers(&args)?;
            if coords.len() != 24 {
                return Err(format!("landmarks expects 24 values, got {}", coords.len()));
            }
            let (left, right) = coords.split_at(12);
            match (landmarks_from_coords(left), landmarks_from_coords(right)) {
                (Some(left), Some(right)) => match binocular_ear(&left, &right) {
                    Some(ear) => Frame::Observed(Observation::AspectRatio(ear)),
                    None => Frame::Missing,
                },
                _ => return Err("landmarks must contain 6 points per eye".to_string()),
            }
        }
        "rects" => {
            let values = parse_numbers(&args)?;
            if values.len() < 2 || values.len() % 2 != 0 {
                return Err(format!(
                    "rects expects face size followed by eye sizes, got {} values",
                    values.len()
                ));
            }
            let face = BoxSize::new(values[0], values[1]);
            let eyes: Vec<BoxSize> = values[2..]
                .chunks_exact(2)
                .map(|pair| BoxSize::new(pair[0], pair[1]))
                .collect();
            Frame::Observed(Observation::AspectRatio(eye_area_ratio(face, &eyes)))
        }
        other => return Err(format!("unknown keyword {other:?}")),
    };

    Ok(Some(frame))
}

fn parse_number(raw: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .map_err(|e| format!("invalid number {raw:?}: {e}"))
}

fn parse_numbers(raw: &[&str]) -> Result<Vec<f64>, String> {
    raw.iter().map(|value| parse_number(value)).collect()
}

type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;

/// 逐行读取观测值的输入源，可选按固定帧率回放
pub struct ObservationSource {
    reader: BufReader<BoxedReader>,
    buf: Vec<u8>,
    line_no: u64,
    pacing: Option<Interval>,
}

impl ObservationSource {
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let boxed: BoxedReader = Box::new(reader);
        Self {
            reader: BufReader::new(boxed),
            buf: Vec::new(),
            line_no: 0,
            pacing: None,
        }
    }

    /// `-` 表示标准输入，其余按文件路径打开
    pub async fn open(location: &str) -> Result<Self, SourceError> {
        if location == "-" {
            return Ok(Self::from_reader(tokio::io::stdin()));
        }
        let file = tokio::fs::File::open(Path::new(location))
            .await
            .map_err(|source| SourceError::Open {
                path: location.to_string(),
                source,
            })?;
        Ok(Self::from_reader(file))
    }

    /// 以 `fps` 帧每秒的节奏回放；0 表示不限速
    pub fn with_replay_fps(mut self, fps: u32) -> Self {
        self.pacing = (fps > 0).then(|| {
            let mut interval = tokio::time::interval(Duration::from_secs(1) / fps);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        self
    }

    /// 读取下一帧，输入结束时返回 `Ok(None)`
    pub async fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            // 非 UTF-8 的行与格式错误的行一样按无效帧处理
            let parsed = std::str::from_utf8(&self.buf)
                .map_err(|e| format!("line is not valid UTF-8: {e}"))
                .and_then(parse_line);
            let frame = match parsed {
                Ok(Some(frame)) => frame,
                Ok(None) => continue,
                Err(reason) => Frame::Invalid {
                    line: self.line_no,
                    reason,
                },
            };

            if let Some(pacing) = self.pacing.as_mut() {
                pacing.tick().await;
            }
            return Ok(Some(frame));
        }
    }
}

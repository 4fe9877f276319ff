/// 连续闭眼帧数阈值的默认值
pub const DEFAULT_CONSECUTIVE_FRAMES: u32 = 3;

/// EAR（眼部纵横比）闭眼阈值，低于此值视为闭眼
pub const DEFAULT_EAR_THRESHOLD: f64 = 0.25;

/// 眼部面积 / 面部面积 比值的闭眼阈值
///
/// 与 EAR 阈值刻度不同，两者不可互换。
pub const DEFAULT_AREA_RATIO_THRESHOLD: f64 = 0.5;

/// 判定为睁眼所需的最少检测眼数
pub const MIN_OPEN_EYE_COUNT: u32 = 2;

/// 单眼 EAR 计算所需的关键点数量
pub const EYE_LANDMARK_POINTS: usize = 6;

/// 单次动作调用的默认超时（秒）
pub const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 5;

/// 眨眼事件广播通道容量
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// 默认最大 SSE 连接数
pub const DEFAULT_MAX_SSE_CONNECTIONS: usize = 16;

use blink_trigger::blink::Observation;

/// 生成一段“睁眼 - 闭眼 n 帧 - 睁眼”的行协议文本
pub fn eye_count_blink(closed_frames: usize) -> String {
    let mut script = String::from("eyes 2\n");
    for _ in 0..closed_frames {
        script.push_str("eyes 0\n");
    }
    script.push_str("eyes 2\n");
    script
}

pub fn open_frame() -> Option<Observation> {
    Some(Observation::EyeCount(2))
}

pub fn closed_frame() -> Option<Observation> {
    Some(Observation::EyeCount(0))
}

//! 渲染汇
//!
//! 展示循环每拍向外部渲染协作方递交一个位姿，核心自身不画任何东西。

use crate::pose::RenderPose;

/// 外部渲染协作方的接口
///
/// 每拍调用一次 `present`；核心不消费返回值。
pub trait RenderSink {
    fn present(&mut self, pose: &RenderPose);
}

/// 控制台渲染汇
///
/// 以欧拉角回显当前位姿（旧上位机的 `x = %d\ty = %d` 输出样式）。
pub struct ConsoleSink;

impl RenderSink for ConsoleSink {
    fn present(&mut self, pose: &RenderPose) {
        let (roll, pitch, yaw) = pose.euler_angles();
        println!(
            "x = {:.1}\ty = {:.1}\tz = {:.1}",
            roll.to_degrees(),
            pitch.to_degrees(),
            yaw.to_degrees()
        );
    }
}

/// 测试用渲染汇：逐拍收集位姿
#[cfg(test)]
pub struct CollectSink {
    pub poses: Vec<RenderPose>,
}

#[cfg(test)]
impl CollectSink {
    pub fn new() -> Self {
        Self { poses: Vec::new() }
    }
}

#[cfg(test)]
impl RenderSink for CollectSink {
    fn present(&mut self, pose: &RenderPose) {
        self.poses.push(*pose);
    }
}

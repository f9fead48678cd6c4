//! 姿态到渲染位姿的映射
//!
//! 把解码出的 [`Orientation`] 换算成渲染端使用的旋转。传感器系与
//! 渲染世界系的差异通过可配置的轴映射表达，不做硬编码假设。

use nalgebra::{Matrix3, Quaternion, Rotation3, UnitQuaternion, Vector3};
use serde::Deserialize;
use tilt_protocol::Orientation;

/// 带符号的轴（配置文件里写 `"x"` / `"-x"` 等）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum SignedAxis {
    #[default]
    #[serde(rename = "x")]
    X,
    #[serde(rename = "-x")]
    NegX,
    #[serde(rename = "y")]
    Y,
    #[serde(rename = "-y")]
    NegY,
    #[serde(rename = "z")]
    Z,
    #[serde(rename = "-z")]
    NegZ,
}

impl SignedAxis {
    fn vector(self) -> Vector3<f64> {
        match self {
            SignedAxis::X => Vector3::x(),
            SignedAxis::NegX => -Vector3::x(),
            SignedAxis::Y => Vector3::y(),
            SignedAxis::NegY => -Vector3::y(),
            SignedAxis::Z => Vector3::z(),
            SignedAxis::NegZ => -Vector3::z(),
        }
    }

    fn default_y() -> Self {
        SignedAxis::Y
    }

    fn default_z() -> Self {
        SignedAxis::Z
    }
}

/// 传感器系到渲染世界系的固定轴映射
///
/// 每个字段给出设备轴在世界系中的像。默认恒等映射。
/// 镜像映射（行列式为 -1）也允许——手性翻转在四元数映射时一并处理。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisMap {
    #[serde(default)]
    pub x: SignedAxis,
    #[serde(default = "SignedAxis::default_y")]
    pub y: SignedAxis,
    #[serde(default = "SignedAxis::default_z")]
    pub z: SignedAxis,
}

impl Default for AxisMap {
    fn default() -> Self {
        Self {
            x: SignedAxis::X,
            y: SignedAxis::Y,
            z: SignedAxis::Z,
        }
    }
}

impl AxisMap {
    /// 映射矩阵（列为设备基向量的像）
    fn matrix(&self) -> Matrix3<f64> {
        Matrix3::from_columns(&[self.x.vector(), self.y.vector(), self.z.vector()])
    }
}

/// 渲染端消费的位姿
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPose {
    pub rotation: Rotation3<f64>,
}

impl RenderPose {
    /// 单位位姿
    pub fn identity() -> Self {
        Self {
            rotation: Rotation3::identity(),
        }
    }

    /// 欧拉角 (roll, pitch, yaw)，弧度
    pub fn euler_angles(&self) -> (f64, f64, f64) {
        self.rotation.euler_angles()
    }
}

/// 把姿态样本映射为渲染位姿
///
/// - 四元数形态：分量归一化后按轴映射换系。对换系矩阵 `P`（正交，
///   行列式 ±1），旋转 `P R Pᵀ` 的四元数是 `(w, det(P)·P·v)`——
///   镜像映射的手性翻转由 `det` 因子吸收。接近零范数的读数
///   （线协议不保证单位范数）退化为单位位姿。
/// - 倾角形态：度转弧度，两个倾角分量按 `R = Rx(angle_x) · Ry(angle_y)`
///   组合（轴映射只作用于四元数形态）。
pub fn map_orientation(orientation: &Orientation, map: &AxisMap) -> RenderPose {
    match *orientation {
        Orientation::Quaternion { w, x, y, z } => {
            let norm = (w * w + x * x + y * y + z * z).sqrt();
            if norm < 1e-12 {
                return RenderPose::identity();
            }

            let p = map.matrix();
            let v = p * Vector3::new(x, y, z) * p.determinant();
            let q = Quaternion::new(w, v.x, v.y, v.z);
            RenderPose {
                rotation: UnitQuaternion::from_quaternion(q).to_rotation_matrix(),
            }
        },
        Orientation::TiltDeg { x, y } => {
            let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), f64::from(x).to_radians());
            let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), f64::from(y).to_radians());
            RenderPose { rotation: rx * ry }
        },
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Node registrations: one entry per node in the executor's node table.
//!
//! The execution plan is a list of indices into this table. Each entry
//! carries the operation kind, an optional custom-operation name, and the
//! tensor indices it reads and writes. Once a delegate takes over a run of
//! nodes, that run is replaced by a single node whose kind is
//! [`OpKind::Delegate`].

use crate::DelegateId;

/// The kind of operation a node performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OpKind {
    Add,
    AveragePool2d,
    Concatenation,
    Conv2d,
    DepthwiseConv2d,
    Dequantize,
    FullyConnected,
    Logistic,
    MaxPool2d,
    Mul,
    Pad,
    Prelu,
    Quantize,
    Relu,
    Relu6,
    Reshape,
    ResizeBilinear,
    Softmax,
    TransposeConv,
    /// A custom operation, identified by [`NodeRegistration::custom_name`].
    Custom,
    /// A collapsed partition owned by a delegate.
    Delegate,
}

impl OpKind {
    /// Every operation kind, in declaration order.
    pub const ALL: [OpKind; 21] = [
        OpKind::Add,
        OpKind::AveragePool2d,
        OpKind::Concatenation,
        OpKind::Conv2d,
        OpKind::DepthwiseConv2d,
        OpKind::Dequantize,
        OpKind::FullyConnected,
        OpKind::Logistic,
        OpKind::MaxPool2d,
        OpKind::Mul,
        OpKind::Pad,
        OpKind::Prelu,
        OpKind::Quantize,
        OpKind::Relu,
        OpKind::Relu6,
        OpKind::Reshape,
        OpKind::ResizeBilinear,
        OpKind::Softmax,
        OpKind::TransposeConv,
        OpKind::Custom,
        OpKind::Delegate,
    ];

    /// Returns the canonical upper-case operator name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::AveragePool2d => "AVERAGE_POOL_2D",
            Self::Concatenation => "CONCATENATION",
            Self::Conv2d => "CONV_2D",
            Self::DepthwiseConv2d => "DEPTHWISE_CONV_2D",
            Self::Dequantize => "DEQUANTIZE",
            Self::FullyConnected => "FULLY_CONNECTED",
            Self::Logistic => "LOGISTIC",
            Self::MaxPool2d => "MAX_POOL_2D",
            Self::Mul => "MUL",
            Self::Pad => "PAD",
            Self::Prelu => "PRELU",
            Self::Quantize => "QUANTIZE",
            Self::Relu => "RELU",
            Self::Relu6 => "RELU6",
            Self::Reshape => "RESHAPE",
            Self::ResizeBilinear => "RESIZE_BILINEAR",
            Self::Softmax => "SOFTMAX",
            Self::TransposeConv => "TRANSPOSE_CONV",
            Self::Custom => "CUSTOM",
            Self::Delegate => "DELEGATE",
        }
    }

    /// Parses an operator name. Case-insensitive; also accepts the
    /// serde spelling (`"CONV2D"`) alongside the canonical one (`"CONV_2D"`).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        let upper = s.to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == upper || op.as_str().replace('_', "") == upper.replace('_', ""))
    }

    /// Returns `true` for the reserved delegate-partition kind.
    pub fn is_delegate(self) -> bool {
        self == Self::Delegate
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the node table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRegistration {
    /// The operation this node performs.
    pub op_kind: OpKind,
    /// Custom-operation name. Backend marker ops are identified by this.
    /// Delegate nodes carry the owning delegate's name here.
    pub custom_name: Option<String>,
    /// Tensor indices read by this node.
    pub inputs: Vec<usize>,
    /// Tensor indices written by this node.
    pub outputs: Vec<usize>,
    /// The delegate that owns this node, if any.
    pub delegate: Option<DelegateId>,
}

impl NodeRegistration {
    /// Creates a builtin node.
    pub fn builtin(op_kind: OpKind, inputs: Vec<usize>, outputs: Vec<usize>) -> Self {
        Self {
            op_kind,
            custom_name: None,
            inputs,
            outputs,
            delegate: None,
        }
    }

    /// Creates a custom-operation node.
    pub fn custom(name: impl Into<String>, inputs: Vec<usize>, outputs: Vec<usize>) -> Self {
        Self {
            op_kind: OpKind::Custom,
            custom_name: Some(name.into()),
            inputs,
            outputs,
            delegate: None,
        }
    }

    /// Returns `true` if this node is a collapsed delegate partition.
    pub fn is_delegated(&self) -> bool {
        self.op_kind.is_delegate()
    }

    /// Returns the custom-operation name, if any.
    pub fn custom_name(&self) -> Option<&str> {
        self.custom_name.as_deref()
    }

    /// Returns a concise one-line description.
    pub fn summary(&self) -> String {
        let label = match (&self.custom_name, self.delegate) {
            (Some(name), Some(id)) => format!(" {name} (delegate #{})", id.0),
            (Some(name), None) => format!(" {name}"),
            (None, Some(id)) => format!(" (delegate #{})", id.0),
            (None, None) => String::new(),
        };
        format!(
            "<{}>{} inputs={:?} outputs={:?}",
            self.op_kind, label, self.inputs, self.outputs,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_kind_from_str() {
        assert_eq!(OpKind::from_str_loose("CONV_2D"), Some(OpKind::Conv2d));
        assert_eq!(OpKind::from_str_loose("conv2d"), Some(OpKind::Conv2d));
        assert_eq!(OpKind::from_str_loose("delegate"), Some(OpKind::Delegate));
        assert_eq!(OpKind::from_str_loose("depthwise_conv_2d"), Some(OpKind::DepthwiseConv2d));
        assert_eq!(OpKind::from_str_loose("not_an_op"), None);
    }

    #[test]
    fn test_delegate_marker_name() {
        assert_eq!(OpKind::Delegate.as_str(), "DELEGATE");
        assert!(OpKind::Delegate.is_delegate());
        assert!(!OpKind::Custom.is_delegate());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&OpKind::DepthwiseConv2d).unwrap();
        assert_eq!(json, "\"DEPTHWISE_CONV2D\"");
        let back: OpKind = serde_json::from_str("\"DELEGATE\"").unwrap();
        assert_eq!(back, OpKind::Delegate);
    }

    #[test]
    fn test_custom_node() {
        let node = NodeRegistration::custom("edgetpu-custom-op", vec![0], vec![1]);
        assert_eq!(node.op_kind, OpKind::Custom);
        assert_eq!(node.custom_name(), Some("edgetpu-custom-op"));
        assert!(!node.is_delegated());
    }

    #[test]
    fn test_summary() {
        let node = NodeRegistration::builtin(OpKind::Conv2d, vec![0, 1], vec![2]);
        let s = node.summary();
        assert!(s.contains("<CONV_2D>"));
        assert!(s.contains("inputs=[0, 1]"));

        let delegated = NodeRegistration {
            op_kind: OpKind::Delegate,
            custom_name: Some("gpu".into()),
            inputs: vec![0],
            outputs: vec![5],
            delegate: Some(DelegateId(3)),
        };
        assert!(delegated.summary().contains("gpu (delegate #3)"));
    }
}

//! Catalog diff 模型与文本摘要
//!
//! 摘要输出只取决于流/字段的全限定名，与输入顺序无关：同一个 diff 渲染
//! 两次，结果逐字节一致。下游会对渲染结果做文本比对，排序必须稳定。

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// 流标识：namespace + name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl StreamDescriptor {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            name: name.into(),
            namespace: if namespace.is_empty() {
                None
            } else {
                Some(namespace)
            },
        }
    }

    pub fn unqualified(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
        }
    }

    /// 全限定名：`namespace.name`，namespace 为空时省略
    pub fn fully_qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) if !ns.is_empty() => format!("{}.{}", ns, self.name),
            _ => self.name.clone(),
        }
    }
}

/// 字段级变更类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldTransformKind {
    AddField,
    RemoveField,
    UpdateFieldSchema,
}

impl FieldTransformKind {
    /// 同一条流内的展示顺序：结构性变更（增/删）排在类型变更之前
    fn sort_priority(&self) -> u8 {
        match self {
            FieldTransformKind::AddField => 0,
            FieldTransformKind::RemoveField => 1,
            FieldTransformKind::UpdateFieldSchema => 2,
        }
    }

    fn glyph(&self) -> &'static str {
        match self {
            FieldTransformKind::AddField => "＋",
            FieldTransformKind::RemoveField => "－",
            FieldTransformKind::UpdateFieldSchema => "～",
        }
    }
}

/// 单个字段的变更，field_name 是从根开始的路径
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTransform {
    pub transform_type: FieldTransformKind,
    pub field_name: Vec<String>,
}

impl FieldTransform {
    pub fn new(transform_type: FieldTransformKind, field_name: Vec<String>) -> Self {
        Self {
            transform_type,
            field_name,
        }
    }

    /// 点分路径表示
    pub fn field_path(&self) -> String {
        self.field_name.join(".")
    }
}

/// 流级变更
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "transform_type", rename_all = "snake_case")]
pub enum StreamTransform {
    AddStream { stream_descriptor: StreamDescriptor },
    RemoveStream { stream_descriptor: StreamDescriptor },
    UpdateStream {
        stream_descriptor: StreamDescriptor,
        field_transforms: Vec<FieldTransform>,
    },
}

impl StreamTransform {
    pub fn stream_descriptor(&self) -> &StreamDescriptor {
        match self {
            StreamTransform::AddStream { stream_descriptor }
            | StreamTransform::RemoveStream { stream_descriptor }
            | StreamTransform::UpdateStream {
                stream_descriptor, ..
            } => stream_descriptor,
        }
    }
}

/// 两个版本 catalog 之间的结构化差异
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDiff {
    pub transforms: Vec<StreamTransform>,
}

impl CatalogDiff {
    pub fn new(transforms: Vec<StreamTransform>) -> Self {
        Self { transforms }
    }
}

/// 字段变更的全序：先按变更类型优先级，再按字段路径
fn field_transform_order(a: &FieldTransform, b: &FieldTransform) -> Ordering {
    a.transform_type
        .sort_priority()
        .cmp(&b.transform_type.sort_priority())
        .then_with(|| a.field_path().cmp(&b.field_path()))
}

/// 将 catalog diff 渲染为按行组织的文本摘要
///
/// 新增/删除的流各自按全限定名升序，新增在前；更新的流按全限定名升序，
/// 流内字段按 [`field_transform_order`] 排序。
pub fn summarize_catalog_diff(diff: &CatalogDiff) -> String {
    let mut summary = String::new();

    let mut added: Vec<&StreamDescriptor> = Vec::new();
    let mut removed: Vec<&StreamDescriptor> = Vec::new();
    let mut updated: Vec<(&StreamDescriptor, &[FieldTransform])> = Vec::new();
    for transform in &diff.transforms {
        match transform {
            StreamTransform::AddStream { stream_descriptor } => added.push(stream_descriptor),
            StreamTransform::RemoveStream { stream_descriptor } => {
                removed.push(stream_descriptor)
            }
            StreamTransform::UpdateStream {
                stream_descriptor,
                field_transforms,
            } => updated.push((stream_descriptor, field_transforms.as_slice())),
        }
    }

    added.sort_by_key(|d| d.fully_qualified_name());
    removed.sort_by_key(|d| d.fully_qualified_name());
    updated.sort_by_key(|(d, _)| d.fully_qualified_name());

    if !added.is_empty() || !removed.is_empty() {
        summary.push_str(&format!(
            " • Streams (+{}/-{})\n",
            added.len(),
            removed.len()
        ));
        for descriptor in &added {
            summary.push_str(&format!("   ＋ {}\n", descriptor.fully_qualified_name()));
        }
        for descriptor in &removed {
            summary.push_str(&format!("   － {}\n", descriptor.fully_qualified_name()));
        }
    }

    if !updated.is_empty() {
        let count_kind = |kind: FieldTransformKind| {
            updated
                .iter()
                .flat_map(|(_, fields)| fields.iter())
                .filter(|f| f.transform_type == kind)
                .count()
        };
        summary.push_str(&format!(
            " • Fields (+{}/~{}/-{})\n",
            count_kind(FieldTransformKind::AddField),
            count_kind(FieldTransformKind::UpdateFieldSchema),
            count_kind(FieldTransformKind::RemoveField),
        ));
        for (descriptor, fields) in &updated {
            summary.push_str(&format!("   • {}\n", descriptor.fully_qualified_name()));
            let mut ordered: Vec<&FieldTransform> = fields.iter().collect();
            ordered.sort_by(|a, b| field_transform_order(a, b));
            for field in ordered {
                summary.push_str(&format!(
                    "     {} {}\n",
                    field.transform_type.glyph(),
                    field.field_path()
                ));
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_stream(namespace: &str, name: &str) -> StreamTransform {
        StreamTransform::AddStream {
            stream_descriptor: StreamDescriptor::new(namespace, name),
        }
    }

    fn remove_stream(namespace: &str, name: &str) -> StreamTransform {
        StreamTransform::RemoveStream {
            stream_descriptor: StreamDescriptor::new(namespace, name),
        }
    }

    fn update_stream(namespace: &str, name: &str, fields: Vec<FieldTransform>) -> StreamTransform {
        StreamTransform::UpdateStream {
            stream_descriptor: StreamDescriptor::new(namespace, name),
            field_transforms: fields,
        }
    }

    fn field(kind: FieldTransformKind, path: &[&str]) -> FieldTransform {
        FieldTransform::new(kind, path.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_fully_qualified_name() {
        assert_eq!(
            StreamDescriptor::new("public", "users").fully_qualified_name(),
            "public.users"
        );
        assert_eq!(
            StreamDescriptor::unqualified("users").fully_qualified_name(),
            "users"
        );
        assert_eq!(
            StreamDescriptor::new("", "users").fully_qualified_name(),
            "users"
        );
    }

    #[test]
    fn test_empty_diff_renders_nothing() {
        assert_eq!(summarize_catalog_diff(&CatalogDiff::default()), "");
    }

    #[test]
    fn test_added_and_removed_streams() {
        let diff = CatalogDiff::new(vec![
            remove_stream("public", "orders"),
            add_stream("public", "users"),
        ]);
        let summary = summarize_catalog_diff(&diff);
        assert_eq!(
            summary,
            " • Streams (+1/-1)\n   ＋ public.users\n   － public.orders\n"
        );
    }

    #[test]
    fn test_added_streams_sorted_by_fully_qualified_name() {
        let diff = CatalogDiff::new(vec![
            add_stream("zeta", "a"),
            add_stream("alpha", "b"),
            add_stream("", "m"),
        ]);
        let summary = summarize_catalog_diff(&diff);
        assert_eq!(
            summary,
            " • Streams (+3/-0)\n   ＋ alpha.b\n   ＋ m\n   ＋ zeta.a\n"
        );
    }

    #[test]
    fn test_updated_stream_field_counts_and_order() {
        let diff = CatalogDiff::new(vec![update_stream(
            "public",
            "users",
            vec![
                field(FieldTransformKind::UpdateFieldSchema, &["b"]),
                field(FieldTransformKind::AddField, &["a"]),
            ],
        )]);
        let summary = summarize_catalog_diff(&diff);
        assert_eq!(
            summary,
            " • Fields (+1/~1/-0)\n   • public.users\n     ＋ a\n     ～ b\n"
        );
    }

    #[test]
    fn test_field_order_add_then_remove_then_update() {
        let diff = CatalogDiff::new(vec![update_stream(
            "public",
            "users",
            vec![
                field(FieldTransformKind::UpdateFieldSchema, &["a"]),
                field(FieldTransformKind::RemoveField, &["z"]),
                field(FieldTransformKind::AddField, &["m"]),
                field(FieldTransformKind::RemoveField, &["b"]),
            ],
        )]);
        let summary = summarize_catalog_diff(&diff);
        assert_eq!(
            summary,
            " • Fields (+1/~1/-2)\n   • public.users\n     ＋ m\n     － b\n     － z\n     ～ a\n"
        );
    }

    #[test]
    fn test_nested_field_path_rendering() {
        let diff = CatalogDiff::new(vec![update_stream(
            "public",
            "users",
            vec![field(
                FieldTransformKind::UpdateFieldSchema,
                &["address", "zip_code"],
            )],
        )]);
        let summary = summarize_catalog_diff(&diff);
        assert!(summary.contains("～ address.zip_code"));
    }

    #[test]
    fn test_field_counts_aggregate_across_streams() {
        let diff = CatalogDiff::new(vec![
            update_stream(
                "public",
                "users",
                vec![field(FieldTransformKind::AddField, &["a"])],
            ),
            update_stream(
                "public",
                "orders",
                vec![
                    field(FieldTransformKind::AddField, &["b"]),
                    field(FieldTransformKind::RemoveField, &["c"]),
                ],
            ),
        ]);
        let summary = summarize_catalog_diff(&diff);
        assert!(summary.starts_with(" • Fields (+2/~0/-1)\n"));
        // streams are ordered by name, orders before users
        let orders_pos = summary.find("public.orders").unwrap();
        let users_pos = summary.find("public.users").unwrap();
        assert!(orders_pos < users_pos);
    }

    #[test]
    fn test_summary_is_deterministic_under_input_reordering() {
        let forward = CatalogDiff::new(vec![
            add_stream("public", "users"),
            remove_stream("public", "orders"),
            update_stream(
                "sales",
                "invoices",
                vec![
                    field(FieldTransformKind::AddField, &["total"]),
                    field(FieldTransformKind::UpdateFieldSchema, &["amount"]),
                ],
            ),
        ]);
        let reversed = CatalogDiff::new(vec![
            update_stream(
                "sales",
                "invoices",
                vec![
                    field(FieldTransformKind::UpdateFieldSchema, &["amount"]),
                    field(FieldTransformKind::AddField, &["total"]),
                ],
            ),
            remove_stream("public", "orders"),
            add_stream("public", "users"),
        ]);

        assert_eq!(
            summarize_catalog_diff(&forward),
            summarize_catalog_diff(&reversed)
        );
        // rendering twice from the same diff is byte-identical
        assert_eq!(
            summarize_catalog_diff(&forward),
            summarize_catalog_diff(&forward)
        );
    }
}

//! 注册表
//!
//! 两级映射：请求类型 -> (限定符 -> 注册描述)。限定符按字典序保存，
//! 回退到任意注册时总是取第一个，保证同一次运行内结果确定。

use crate::descriptor::Descriptor;
use dashmap::DashMap;
use di_abstractions::RegistrationInfo;
use infrastructure_common::{normalize_qualifier, TypeInfo, DEFAULT_QUALIFIER};
use std::any::TypeId;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

struct TypeEntry {
    requested: TypeInfo,
    /// 类型自身标记声明的非默认限定符，作为不指定限定符时的查找目标
    primary_qualifier: Option<String>,
    qualifiers: BTreeMap<String, Arc<Descriptor>>,
}

/// 注册表
#[derive(Default)]
pub(crate) struct Registry {
    entries: DashMap<TypeId, TypeEntry>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// 请求类型是否已有注册
    pub(crate) fn contains_type(&self, id: TypeId) -> bool {
        self.entries.contains_key(&id)
    }

    /// 声明注册，（请求类型，限定符）已存在时保留先注册者并返回 `false`
    pub(crate) fn declare(
        &self,
        descriptor: Arc<Descriptor>,
        primary_qualifier: Option<&str>,
    ) -> bool {
        let requested = descriptor.requested();
        let mut entry = self
            .entries
            .entry(requested.id)
            .or_insert_with(|| TypeEntry {
                requested,
                primary_qualifier: None,
                qualifiers: BTreeMap::new(),
            });

        if let Some(primary) = primary_qualifier.filter(|q| !q.is_empty() && *q != DEFAULT_QUALIFIER) {
            if entry.primary_qualifier.is_none() {
                entry.primary_qualifier = Some(primary.to_string());
            }
        }

        match entry.qualifiers.entry(descriptor.qualifier().to_string()) {
            Entry::Occupied(existing) => {
                debug!(
                    "注册已存在，保留先注册者: {} [{}] -> {}",
                    requested.name,
                    existing.key(),
                    existing.get().concrete().name
                );
                false
            }
            Entry::Vacant(slot) => {
                debug!(
                    "声明注册: {} [{}] -> {} ({})",
                    requested.name,
                    slot.key(),
                    descriptor.concrete().name,
                    descriptor.strategy()
                );
                slot.insert(descriptor);
                true
            }
        }
    }

    /// 按限定符查找：精确匹配，然后默认限定符，然后字典序第一个
    pub(crate) fn lookup(&self, id: TypeId, qualifier: Option<&str>) -> Option<Arc<Descriptor>> {
        let entry = self.entries.get(&id)?;
        let wanted = match qualifier {
            Some(qualifier) => normalize_qualifier(Some(qualifier)),
            None => entry
                .primary_qualifier
                .as_deref()
                .unwrap_or(DEFAULT_QUALIFIER),
        };

        // 先取出结果，读锁守卫在返回前释放
        let found = entry
            .qualifiers
            .get(wanted)
            .or_else(|| entry.qualifiers.get(DEFAULT_QUALIFIER))
            .or_else(|| entry.qualifiers.values().next())
            .cloned();
        found
    }

    /// 请求类型自身名下的全部注册，按限定符排序
    pub(crate) fn descriptors_of(&self, id: TypeId) -> Vec<Arc<Descriptor>> {
        self.entries
            .get(&id)
            .map(|entry| entry.qualifiers.values().cloned().collect())
            .unwrap_or_default()
    }

    /// 已注册的请求类型名称（排序后）
    pub(crate) fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .map(|entry| entry.requested.name.to_string())
            .collect();
        names.sort();
        names
    }

    /// 全部注册信息
    pub(crate) fn snapshot(&self) -> Vec<RegistrationInfo> {
        let mut rows: Vec<RegistrationInfo> = self
            .entries
            .iter()
            .flat_map(|entry| {
                entry
                    .qualifiers
                    .values()
                    .map(|descriptor| descriptor.registration_info())
                    .collect::<Vec<_>>()
            })
            .collect();
        rows.sort_by(|a, b| {
            a.requested
                .name
                .cmp(b.requested.name)
                .then_with(|| a.qualifier.cmp(&b.qualifier))
        });
        rows
    }

    /// 注册描述总数
    pub(crate) fn len(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| entry.qualifiers.len())
            .sum()
    }
}

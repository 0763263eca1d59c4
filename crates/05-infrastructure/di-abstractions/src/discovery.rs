//! 类型发现抽象接口
//!
//! 提供候选类型的发现能力，作用域为模块路径前缀

use infrastructure_common::TypeDescriptor;
use std::collections::HashSet;

/// 类型发现器 trait
pub trait TypeDiscovery: Send + Sync {
    /// 获取发现器名称
    fn name(&self) -> &str;

    /// 发现满足条件的类型
    fn find_matching(&self, criteria: &DiscoveryCriteria) -> Vec<TypeDescriptor>;

    /// 发现全部候选类型
    fn find(&self) -> Vec<TypeDescriptor> {
        self.find_matching(&DiscoveryCriteria::new())
    }

    /// 发现指定模块路径下的候选类型
    fn find_in(&self, scope: &str) -> Vec<TypeDescriptor> {
        self.find_matching(&DiscoveryCriteria::new().add_search_path(scope))
    }
}

/// 类型标记过滤条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerFilter {
    /// 可注入标记
    Injectable,
    /// 启动入口标记
    EntryPoint,
    /// 配置类标记
    Setup,
}

impl MarkerFilter {
    /// 类型是否带有该标记
    pub fn matches(self, descriptor: &TypeDescriptor) -> bool {
        match self {
            Self::Injectable => descriptor.injectable().is_some(),
            Self::EntryPoint => descriptor.entry_point().is_some(),
            Self::Setup => descriptor.is_setup(),
        }
    }
}

/// 发现条件
#[derive(Debug, Clone, Default)]
pub struct DiscoveryCriteria {
    /// 搜索路径（模块路径前缀）
    pub search_paths: Vec<String>,
    /// 包含的模式（类型名称子串）
    pub include_patterns: Vec<String>,
    /// 排除的模式（类型名称子串）
    pub exclude_patterns: Vec<String>,
    /// 要求的标记，任一满足即可
    pub markers: Vec<MarkerFilter>,
}

impl DiscoveryCriteria {
    /// 创建新的发现条件
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加搜索路径
    pub fn add_search_path<S: Into<String>>(mut self, path: S) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// 添加包含模式
    pub fn add_include_pattern<S: Into<String>>(mut self, pattern: S) -> Self {
        self.include_patterns.push(pattern.into());
        self
    }

    /// 添加排除模式
    pub fn add_exclude_pattern<S: Into<String>>(mut self, pattern: S) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// 添加标记过滤
    pub fn with_marker(mut self, marker: MarkerFilter) -> Self {
        self.markers.push(marker);
        self
    }

    /// 类型是否满足条件
    pub fn matches(&self, descriptor: &TypeDescriptor) -> bool {
        let name = descriptor.name();
        let module = descriptor.module_path();

        let in_scope = self.search_paths.is_empty()
            || self
                .search_paths
                .iter()
                .any(|path| module == path || module.starts_with(&format!("{path}::")));
        let included = self.include_patterns.is_empty()
            || self.include_patterns.iter().any(|p| name.contains(p.as_str()));
        let excluded = self.exclude_patterns.iter().any(|p| name.contains(p.as_str()));
        let marked =
            self.markers.is_empty() || self.markers.iter().any(|marker| marker.matches(descriptor));

        in_scope && included && !excluded && marked
    }

    /// 过滤并按类型去重，保留首次出现的顺序
    pub fn apply(&self, descriptors: impl IntoIterator<Item = TypeDescriptor>) -> Vec<TypeDescriptor> {
        let mut seen = HashSet::new();
        descriptors
            .into_iter()
            .filter(|descriptor| self.matches(descriptor))
            .filter(|descriptor| seen.insert(descriptor.info()))
            .collect()
    }
}

// ==========================================
// 模型模板参数配置 - 参数分组与参数树
// ==========================================
// 职责: 有序的分组容器 + 根节点 (CONFIGURABLE_PARAMETERS)
// 路径: 以 '.' 连接各级键名，如 dataset.train_batch_size
// ==========================================

use crate::domain::parameter::Parameter;
use crate::domain::value::ParameterValue;

/// 路径分隔符
pub const PATH_SEPARATOR: char = '.';

/// 分组自身的元数据字段（与子节点共用同一映射）
pub const GROUP_METADATA_KEYS: &[&str] = &["type", "header", "description", "visible_in_ui"];

/// 根节点额外的元数据字段
pub const ROOT_METADATA_KEYS: &[&str] = &["id"];

/// 参数树节点
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigNode {
    Group(ParameterGroup),
    Parameter(Parameter),
}

impl From<ParameterGroup> for ConfigNode {
    fn from(g: ParameterGroup) -> Self {
        ConfigNode::Group(g)
    }
}

impl From<Parameter> for ConfigNode {
    fn from(p: Parameter) -> Self {
        ConfigNode::Parameter(p)
    }
}

/// 参数分组
///
/// children 按文档顺序保存；键唯一性由校验器检查，构造时不做去重。
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGroup {
    pub header: String,
    pub description: String,
    pub visible_in_ui: bool,
    pub children: Vec<(String, ConfigNode)>,
}

impl ParameterGroup {
    pub fn new(header: &str) -> Self {
        Self {
            header: header.to_string(),
            description: header.to_string(),
            visible_in_ui: true,
            children: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_child(mut self, key: &str, node: impl Into<ConfigNode>) -> Self {
        self.children.push((key.to_string(), node.into()));
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible_in_ui = false;
        self
    }

    pub fn get(&self, key: &str) -> Option<&ConfigNode> {
        self.children.iter().find(|(k, _)| k == key).map(|(_, n)| n)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ConfigNode> {
        self.children
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, n)| n)
    }

    /// 按路径分段查找节点
    fn find_node(&self, segments: &[&str]) -> Option<&ConfigNode> {
        let (first, rest) = segments.split_first()?;
        let node = self.get(first)?;
        if rest.is_empty() {
            return Some(node);
        }
        match node {
            ConfigNode::Group(g) => g.find_node(rest),
            ConfigNode::Parameter(_) => None,
        }
    }

    fn find_node_mut(&mut self, segments: &[&str]) -> Option<&mut ConfigNode> {
        let (first, rest) = segments.split_first()?;
        let node = self.get_mut(first)?;
        if rest.is_empty() {
            return Some(node);
        }
        match node {
            ConfigNode::Group(g) => g.find_node_mut(rest),
            ConfigNode::Parameter(_) => None,
        }
    }

    fn clear_values(&mut self) -> usize {
        let mut cleared = 0;
        for (_, node) in self.children.iter_mut() {
            match node {
                ConfigNode::Parameter(p) => {
                    if p.value.take().is_some() {
                        cleared += 1;
                    }
                }
                ConfigNode::Group(g) => cleared += g.clear_values(),
            }
        }
        cleared
    }

    fn collect_parameters<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a Parameter)>) {
        for (key, node) in &self.children {
            let path = join_path(prefix, key);
            match node {
                ConfigNode::Parameter(p) => out.push((path, p)),
                ConfigNode::Group(g) => g.collect_parameters(&path, out),
            }
        }
    }
}

/// 参数树（根节点）
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigTree {
    /// 模板 ID（可为空字符串）
    pub id: String,
    pub root: ParameterGroup,
}

impl ConfigTree {
    pub fn new(id: &str, root: ParameterGroup) -> Self {
        Self {
            id: id.to_string(),
            root,
        }
    }

    /// 按点分路径查找参数
    pub fn find_parameter(&self, path: &str) -> Option<&Parameter> {
        let segments = split_path(path);
        match self.root.find_node(&segments)? {
            ConfigNode::Parameter(p) => Some(p),
            ConfigNode::Group(_) => None,
        }
    }

    pub fn find_parameter_mut(&mut self, path: &str) -> Option<&mut Parameter> {
        let segments = split_path(path);
        match self.root.find_node_mut(&segments)? {
            ConfigNode::Parameter(p) => Some(p),
            ConfigNode::Group(_) => None,
        }
    }

    /// 按点分路径查找分组
    pub fn find_group(&self, path: &str) -> Option<&ParameterGroup> {
        if path.is_empty() {
            return Some(&self.root);
        }
        let segments = split_path(path);
        match self.root.find_node(&segments)? {
            ConfigNode::Group(g) => Some(g),
            ConfigNode::Parameter(_) => None,
        }
    }

    /// 按文档顺序列出全部叶子参数及其路径
    pub fn parameters(&self) -> Vec<(String, &Parameter)> {
        let mut out = Vec::new();
        self.root.collect_parameters("", &mut out);
        out
    }

    /// 清除全部覆写值，返回被清除的个数
    pub fn clear_overrides(&mut self) -> usize {
        self.root.clear_values()
    }

    /// 参数当前生效值（覆写或默认）
    pub fn effective_value(&self, path: &str) -> Option<ParameterValue> {
        self.find_parameter(path).map(|p| p.effective_value().clone())
    }
}

pub fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}{}{}", prefix, PATH_SEPARATOR, key)
    }
}

/// 子节点键名是否与所在分组的元数据字段冲突
pub fn is_reserved_key(key: &str, at_root: bool) -> bool {
    GROUP_METADATA_KEYS.contains(&key) || (at_root && ROOT_METADATA_KEYS.contains(&key))
}

fn split_path(path: &str) -> Vec<&str> {
    path.split(PATH_SEPARATOR).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> ConfigTree {
        let dataset = ParameterGroup::new("Dataset Parameters")
            .with_child("train_batch_size", Parameter::integer("Batch size", 32, 1, 512))
            .with_child("num_workers", Parameter::integer("Number of workers", 8, 0, 36));
        let nncf = ParameterGroup::new("Optimization by NNCF")
            .with_child("enable_pruning", Parameter::boolean("Enable filter pruning", false));
        let root = ParameterGroup::new("Configuration for STFPM")
            .with_child("dataset", dataset)
            .with_child("nncf_optimization", nncf);
        ConfigTree::new("", root)
    }

    #[test]
    fn test_find_parameter() {
        let tree = sample_tree();
        let p = tree.find_parameter("dataset.train_batch_size").unwrap();
        assert_eq!(p.header, "Batch size");
        assert!(tree.find_parameter("dataset").is_none());
        assert!(tree.find_parameter("dataset.train_batch_size.x").is_none());
        assert!(tree.find_parameter("missing").is_none());
    }

    #[test]
    fn test_find_group() {
        let tree = sample_tree();
        assert_eq!(tree.find_group("").unwrap().header, "Configuration for STFPM");
        assert_eq!(tree.find_group("nncf_optimization").unwrap().children.len(), 1);
        assert!(tree.find_group("dataset.num_workers").is_none());
    }

    #[test]
    fn test_parameters_in_document_order() {
        let tree = sample_tree();
        let paths: Vec<String> = tree.parameters().into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            paths,
            vec![
                "dataset.train_batch_size",
                "dataset.num_workers",
                "nncf_optimization.enable_pruning",
            ]
        );
    }

    #[test]
    fn test_effective_value_mutation() {
        let mut tree = sample_tree();
        tree.find_parameter_mut("dataset.num_workers").unwrap().value =
            Some(ParameterValue::Integer(4));
        assert_eq!(
            tree.effective_value("dataset.num_workers"),
            Some(ParameterValue::Integer(4))
        );
        assert_eq!(
            tree.effective_value("dataset.train_batch_size"),
            Some(ParameterValue::Integer(32))
        );

        assert_eq!(tree.clear_overrides(), 1);
        assert_eq!(tree, sample_tree());
    }

    #[test]
    fn test_reserved_keys() {
        assert!(is_reserved_key("description", false));
        assert!(is_reserved_key("id", true));
        assert!(!is_reserved_key("id", false));
        assert!(!is_reserved_key("train_batch_size", true));
    }
}

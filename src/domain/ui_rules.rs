// ==========================================
// 模型模板参数配置 - UI 规则表达式
// ==========================================
// 职责: 参数的条件启用/隐藏规则（ui_rules）
// 结构: 叶子规则 RULE / 组合规则 UI_RULES（AND/OR，可递归嵌套）
// ==========================================

use crate::domain::types::{Comparison, LogicalOperator, UiAction};
use crate::domain::value::ParameterValue;

/// 叶子规则：比较某个参数的当前生效值
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// 被引用参数的路径分段（如 ["learning_parameters", "batch_size"]）
    pub parameter: Vec<String>,
    pub operator: Comparison,
    pub value: ParameterValue,
}

impl Rule {
    pub fn new(parameter: &[&str], operator: Comparison, value: impl Into<ParameterValue>) -> Self {
        Self {
            parameter: parameter.iter().map(|s| s.to_string()).collect(),
            operator,
            value: value.into(),
        }
    }

    /// 被引用参数的点分路径
    pub fn parameter_path(&self) -> String {
        self.parameter.join(".")
    }

    /// 对单个取值求值；引用参数不存在时规则不成立
    fn evaluate<F>(&self, lookup: &F) -> bool
    where
        F: Fn(&str) -> Option<ParameterValue>,
    {
        let Some(actual) = lookup(&self.parameter_path()) else {
            return false;
        };

        match self.operator {
            Comparison::EqualTo => actual.loosely_equals(&self.value),
            Comparison::NotEqualTo => !actual.loosely_equals(&self.value),
            Comparison::LessThan => actual
                .compare(&self.value)
                .map(|o| o.is_lt())
                .unwrap_or(false),
            Comparison::GreaterThan => actual
                .compare(&self.value)
                .map(|o| o.is_gt())
                .unwrap_or(false),
        }
    }
}

/// 规则表达式节点
#[derive(Debug, Clone, PartialEq)]
pub enum RuleExpr {
    Rule(Rule),
    Composite(UiRules),
}

impl RuleExpr {
    fn evaluate<F>(&self, lookup: &F) -> bool
    where
        F: Fn(&str) -> Option<ParameterValue>,
    {
        match self {
            RuleExpr::Rule(rule) => rule.evaluate(lookup),
            RuleExpr::Composite(group) => group.evaluate(lookup),
        }
    }
}

/// 组合规则（ui_rules 对象）
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UiRules {
    pub action: UiAction,
    pub operator: LogicalOperator,
    pub rules: Vec<RuleExpr>,
}

impl UiRules {
    pub fn new(action: UiAction, operator: LogicalOperator) -> Self {
        Self {
            action,
            operator,
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(RuleExpr::Rule(rule));
        self
    }

    pub fn with_group(mut self, group: UiRules) -> Self {
        self.rules.push(RuleExpr::Composite(group));
        self
    }

    /// 空规则集（模板中的默认 no-op）
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 对当前参数取值求值
    ///
    /// - 空规则集恒不成立（动作不触发）
    /// - AND / OR 短路求值，仅在需要时查询参数取值
    pub fn evaluate<F>(&self, lookup: &F) -> bool
    where
        F: Fn(&str) -> Option<ParameterValue>,
    {
        if self.rules.is_empty() {
            return false;
        }

        match self.operator {
            LogicalOperator::And => self.rules.iter().all(|r| r.evaluate(lookup)),
            LogicalOperator::Or => self.rules.iter().any(|r| r.evaluate(lookup)),
        }
    }

    /// 收集所有叶子规则引用的参数路径（含嵌套）
    pub fn referenced_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths(&self, out: &mut Vec<String>) {
        for expr in &self.rules {
            match expr {
                RuleExpr::Rule(rule) => out.push(rule.parameter_path()),
                RuleExpr::Composite(group) => group.collect_paths(out),
            }
        }
    }
}

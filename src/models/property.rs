//! 物件数据模型
//!
//! 服务器从 PDF 中解析出的结构化字段，用户可以逐项修改后再提交生成

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::WorkflowError;

/// 设备・特徴 的分隔符
pub const FEATURE_DELIMITER: char = '、';

/// 解析结果（物件数据）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyData {
    pub property_type: String,
    pub transaction_type: String,
    pub price: String,
    pub address: String,
    pub access: String,
    pub floor_plan: String,
    pub building_area: String,
    pub land_area: String,
    pub building_age: String,
    pub structure: String,
    pub parking: String,
    pub features: Vec<String>,
    /// 服务器返回的其它字段，原样回传
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertyData {
    /// 读取字段（列表字段以分隔符拼接）
    pub fn get(&self, field: PropertyField) -> String {
        match self.text_field(field) {
            Some(text) => text.clone(),
            None => join_features(&self.features),
        }
    }

    /// 修改字段
    ///
    /// `features` 按 `、` 拆分，每项去掉首尾空白；空字符串得到空列表
    pub fn set(&mut self, field: PropertyField, value: &str) {
        if field.is_list() {
            self.features = split_features(value);
        } else if let Some(text) = self.text_field_mut(field) {
            *text = value.to_string();
        }
    }

    fn text_field(&self, field: PropertyField) -> Option<&String> {
        let text = match field {
            PropertyField::PropertyType => &self.property_type,
            PropertyField::TransactionType => &self.transaction_type,
            PropertyField::Price => &self.price,
            PropertyField::Address => &self.address,
            PropertyField::Access => &self.access,
            PropertyField::FloorPlan => &self.floor_plan,
            PropertyField::BuildingArea => &self.building_area,
            PropertyField::LandArea => &self.land_area,
            PropertyField::BuildingAge => &self.building_age,
            PropertyField::Structure => &self.structure,
            PropertyField::Parking => &self.parking,
            PropertyField::Features => return None,
        };
        Some(text)
    }

    fn text_field_mut(&mut self, field: PropertyField) -> Option<&mut String> {
        let text = match field {
            PropertyField::PropertyType => &mut self.property_type,
            PropertyField::TransactionType => &mut self.transaction_type,
            PropertyField::Price => &mut self.price,
            PropertyField::Address => &mut self.address,
            PropertyField::Access => &mut self.access,
            PropertyField::FloorPlan => &mut self.floor_plan,
            PropertyField::BuildingArea => &mut self.building_area,
            PropertyField::LandArea => &mut self.land_area,
            PropertyField::BuildingAge => &mut self.building_age,
            PropertyField::Structure => &mut self.structure,
            PropertyField::Parking => &mut self.parking,
            PropertyField::Features => return None,
        };
        Some(text)
    }
}

/// 拆分 设备・特徴 输入
pub fn split_features(value: &str) -> Vec<String> {
    if value.is_empty() {
        return Vec::new();
    }
    value
        .split(FEATURE_DELIMITER)
        .map(|item| item.trim().to_string())
        .collect()
}

/// 拼接 设备・特徴 用于显示和编辑
pub fn join_features(features: &[String]) -> String {
    let mut delimiter = [0u8; 4];
    features.join(FEATURE_DELIMITER.encode_utf8(&mut delimiter))
}

/// 可编辑字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyField {
    PropertyType,
    TransactionType,
    Price,
    Address,
    Access,
    FloorPlan,
    BuildingArea,
    LandArea,
    BuildingAge,
    Structure,
    Parking,
    /// 列表字段
    Features,
}

impl PropertyField {
    /// 全部字段（按页面显示顺序）
    pub const ALL: [PropertyField; 12] = [
        PropertyField::PropertyType,
        PropertyField::TransactionType,
        PropertyField::Price,
        PropertyField::Address,
        PropertyField::Access,
        PropertyField::FloorPlan,
        PropertyField::BuildingArea,
        PropertyField::LandArea,
        PropertyField::BuildingAge,
        PropertyField::Structure,
        PropertyField::Parking,
        PropertyField::Features,
    ];

    /// 接口中的字段名
    pub fn key(self) -> &'static str {
        match self {
            PropertyField::PropertyType => "property_type",
            PropertyField::TransactionType => "transaction_type",
            PropertyField::Price => "price",
            PropertyField::Address => "address",
            PropertyField::Access => "access",
            PropertyField::FloorPlan => "floor_plan",
            PropertyField::BuildingArea => "building_area",
            PropertyField::LandArea => "land_area",
            PropertyField::BuildingAge => "building_age",
            PropertyField::Structure => "structure",
            PropertyField::Parking => "parking",
            PropertyField::Features => "features",
        }
    }

    /// 显示名称
    pub fn label(self) -> &'static str {
        match self {
            PropertyField::PropertyType => "物件種別",
            PropertyField::TransactionType => "取引種別",
            PropertyField::Price => "価格・賃料",
            PropertyField::Address => "所在地",
            PropertyField::Access => "交通",
            PropertyField::FloorPlan => "間取り",
            PropertyField::BuildingArea => "建物面積",
            PropertyField::LandArea => "土地面積",
            PropertyField::BuildingAge => "築年数",
            PropertyField::Structure => "構造",
            PropertyField::Parking => "駐車場",
            PropertyField::Features => "設備・特徴",
        }
    }

    pub fn is_list(self) -> bool {
        matches!(self, PropertyField::Features)
    }
}

impl std::str::FromStr for PropertyField {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropertyField::ALL
            .iter()
            .copied()
            .find(|field| field.key() == s)
            .ok_or_else(|| WorkflowError::UnknownField {
                field: s.to_string(),
            })
    }
}

impl std::fmt::Display for PropertyField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_features_round_trip() {
        let features = vec![
            "駐車場".to_string(),
            "南向き".to_string(),
            "ペット可".to_string(),
        ];
        assert_eq!(split_features(&join_features(&features)), features);
    }

    #[test]
    fn test_split_features_trims_and_handles_empty() {
        assert_eq!(
            split_features(" 駐車場 、 南向き"),
            vec!["駐車場".to_string(), "南向き".to_string()]
        );
        assert!(split_features("").is_empty());
    }

    #[test]
    fn test_set_and_get_field() {
        let mut data = PropertyData::default();
        data.set(PropertyField::Price, "3,980万円");
        data.set(PropertyField::Features, "オートロック、宅配ボックス");

        assert_eq!(data.price, "3,980万円");
        assert_eq!(data.get(PropertyField::Price), "3,980万円");
        assert_eq!(data.features.len(), 2);
        assert_eq!(
            data.get(PropertyField::Features),
            "オートロック、宅配ボックス"
        );
    }

    #[test]
    fn test_parse_field_key() {
        assert_eq!(
            "floor_plan".parse::<PropertyField>(),
            Ok(PropertyField::FloorPlan)
        );
        assert!("features".parse::<PropertyField>().unwrap().is_list());
        assert_eq!(
            "balcony".parse::<PropertyField>(),
            Err(WorkflowError::UnknownField {
                field: "balcony".to_string()
            })
        );
    }

    #[test]
    fn test_deserialize_keeps_unknown_keys() {
        let value = json!({
            "price": "8万円",
            "address": "東京都渋谷区",
            "features": ["駐車場"],
            "station_count": 2
        });
        let data: PropertyData = serde_json::from_value(value).unwrap();
        assert_eq!(data.price, "8万円");
        assert_eq!(data.floor_plan, "");
        assert_eq!(data.extra.get("station_count"), Some(&json!(2)));

        let back = serde_json::to_value(&data).unwrap();
        assert_eq!(back["station_count"], json!(2));
        assert_eq!(back["features"], json!(["駐車場"]));
    }
}

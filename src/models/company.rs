//! 会社情報（マイソク下部的公司信息栏）
//!
//! 服务器在生成 マイソク 之前要求先登记会社情報，
//! 否则生成接口返回「会社情報が設定されていません」

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::SelectedFile;

/// 会社情報
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyInfo {
    pub company_name: String,
    pub company_name_kana: String,
    pub postal_code: String,
    pub address: String,
    pub phone: String,
    pub fax: String,
    pub email: String,
    pub website: String,
    pub license_number: String,
    pub representative_name: String,
}

impl CompanyInfo {
    /// 表单字段，键名与服务器一致
    pub fn form_fields(&self) -> [(&'static str, &str); 10] {
        [
            ("company_name", self.company_name.as_str()),
            ("company_name_kana", self.company_name_kana.as_str()),
            ("postal_code", self.postal_code.as_str()),
            ("address", self.address.as_str()),
            ("phone", self.phone.as_str()),
            ("fax", self.fax.as_str()),
            ("email", self.email.as_str()),
            ("website", self.website.as_str()),
            ("license_number", self.license_number.as_str()),
            ("representative_name", self.representative_name.as_str()),
        ]
    }

    /// 检查必填项和格式，返回全部问题
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("会社名", &self.company_name),
            ("住所", &self.address),
            ("電話番号", &self.phone),
            ("宅建業免許番号", &self.license_number),
        ];

        let mut errors: Vec<String> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(label, _)| format!("{}: この項目は必須です", label))
            .collect();

        if !self.email.is_empty() && !is_valid_email(&self.email) {
            errors.push("メールアドレス: 正しいメールアドレスを入力してください".to_string());
        }
        if !self.website.is_empty() && reqwest::Url::parse(&self.website).is_err() {
            errors.push("ウェブサイト: 正しいURLを入力してください".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(errors))
        }
    }
}

fn is_valid_email(email: &str) -> bool {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
        .map(|re| re.is_match(email))
        .unwrap_or(false)
}

/// 会社情報 + 可选的 Logo 图片
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanySettings {
    pub info: CompanyInfo,
    pub logo: Option<SelectedFile>,
}

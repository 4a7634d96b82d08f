/// 转换服务器 HTTP 客户端
///
/// 封装 `/upload_pdf`、`/generate_mysouku`、`/process_pdf_simple`、`/save_company` 四个接口
use crate::clients::backend::{ConversionBackend, ExtractedDocument, GeneratedPdf};
use crate::config::Config;
use crate::error::{AppError, AppResult, ApiError, ConfigError};
use crate::models::{CompanySettings, OutputFormat, PropertyData, SelectedFile};
use async_trait::async_trait;
use base64::Engine;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const UPLOAD_ENDPOINT: &str = "upload_pdf";
const GENERATE_ENDPOINT: &str = "generate_mysouku";
const SIMPLE_ENDPOINT: &str = "process_pdf_simple";
const COMPANY_ENDPOINT: &str = "save_company";

/// 接口统一的响应格式
#[derive(Debug, Default, Deserialize)]
struct ApiEnvelope {
    status: Option<String>,
    message: Option<String>,
    file_id: Option<String>,
    filename: Option<String>,
    extracted_data: Option<PropertyData>,
    pdf_data: Option<String>,
    raw_text: Option<String>,
}

/// 转换服务器客户端
pub struct ConversionClient {
    base_url: String,
    http: Client,
}

impl ConversionClient {
    /// 创建新的客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = Client::builder().build().map_err(|e| {
            AppError::Config(ConfigError::ClientBuildFailed {
                source: Box::new(e),
            })
        })?;

        Ok(Self {
            base_url: config.server_base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// 文件上传用的 multipart 片段
    fn file_part(endpoint: &str, file: &SelectedFile) -> Result<Part, ApiError> {
        Part::bytes(file.data.clone())
            .file_name(file.name.clone())
            .mime_str(&file.media_type)
            .map_err(|e| ApiError::RequestFailed {
                endpoint: endpoint.to_string(),
                source: Box::new(e),
            })
    }

    /// 构建上传 PDF 用的 multipart 表单
    fn pdf_form(endpoint: &str, file: &SelectedFile) -> Result<Form, ApiError> {
        Ok(Form::new().part("pdf_file", Self::file_part(endpoint, file)?))
    }

    /// 发送请求并解析响应
    async fn send(
        &self,
        endpoint: &str,
        request: RequestBuilder,
        timeout: Duration,
        fallback_message: &str,
    ) -> Result<ApiEnvelope, ApiError> {
        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error(endpoint, timeout, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(endpoint, timeout, e))?;

        debug!("{} 响应: HTTP {} ({} 字节)", endpoint, status, body.len());

        interpret_response(endpoint, status, &body, fallback_message)
    }
}

#[async_trait]
impl ConversionBackend for ConversionClient {
    async fn extract(
        &self,
        file: &SelectedFile,
        timeout: Duration,
    ) -> Result<ExtractedDocument, ApiError> {
        let form = Self::pdf_form(UPLOAD_ENDPOINT, file)?;
        let request = self.http.post(self.url(UPLOAD_ENDPOINT)).multipart(form);

        let envelope = self
            .send(UPLOAD_ENDPOINT, request, timeout, "上传失败")
            .await?;

        let file_id = envelope.file_id.ok_or(ApiError::MissingField {
            endpoint: UPLOAD_ENDPOINT.to_string(),
            field: "file_id",
        })?;
        let data = envelope.extracted_data.ok_or(ApiError::MissingField {
            endpoint: UPLOAD_ENDPOINT.to_string(),
            field: "extracted_data",
        })?;

        Ok(ExtractedDocument {
            file_id,
            filename: envelope.filename,
            data,
            raw_text: envelope.raw_text,
        })
    }

    async fn generate(
        &self,
        data: &PropertyData,
        file_id: &str,
        timeout: Duration,
    ) -> Result<GeneratedPdf, ApiError> {
        let payload = json!({
            "property_data": data,
            "file_id": file_id,
        });

        debug!("生成 Payload: {}", payload);

        let request = self.http.post(self.url(GENERATE_ENDPOINT)).json(&payload);
        let envelope = self
            .send(GENERATE_ENDPOINT, request, timeout, "マイソク生成失败")
            .await?;

        decode_pdf(GENERATE_ENDPOINT, envelope)
    }

    async fn convert(
        &self,
        file: &SelectedFile,
        output_format: OutputFormat,
        timeout: Duration,
    ) -> Result<GeneratedPdf, ApiError> {
        let form = Self::pdf_form(SIMPLE_ENDPOINT, file)?
            .text("output_format", output_format.as_str());
        let request = self.http.post(self.url(SIMPLE_ENDPOINT)).multipart(form);

        let envelope = self
            .send(SIMPLE_ENDPOINT, request, timeout, "PDF处理失败")
            .await?;

        decode_pdf(SIMPLE_ENDPOINT, envelope)
    }

    async fn save_company(
        &self,
        company: &CompanySettings,
        timeout: Duration,
    ) -> Result<String, ApiError> {
        let mut form = Form::new();
        for (key, value) in company.info.form_fields() {
            form = form.text(key, value.to_string());
        }
        if let Some(logo) = &company.logo {
            form = form.part("logo", Self::file_part(COMPANY_ENDPOINT, logo)?);
        }

        let request = self.http.post(self.url(COMPANY_ENDPOINT)).multipart(form);
        let envelope = self
            .send(COMPANY_ENDPOINT, request, timeout, "保存に失敗しました")
            .await?;

        Ok(envelope
            .message
            .unwrap_or_else(|| "会社情報を保存しました".to_string()))
    }
}

fn transport_error(endpoint: &str, timeout: Duration, err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout {
            endpoint: endpoint.to_string(),
            timeout_secs: timeout.as_secs(),
        }
    } else {
        ApiError::RequestFailed {
            endpoint: endpoint.to_string(),
            source: Box::new(err),
        }
    }
}

/// 检查状态码和 `status` 字段
fn interpret_response(
    endpoint: &str,
    status: u16,
    body: &str,
    fallback_message: &str,
) -> Result<ApiEnvelope, ApiError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<ApiEnvelope>(body)
            .ok()
            .and_then(|envelope| envelope.message);
        return Err(ApiError::BadStatus {
            endpoint: endpoint.to_string(),
            status,
            message,
        });
    }

    let envelope: ApiEnvelope =
        serde_json::from_str(body).map_err(|e| ApiError::JsonParseFailed {
            source: Box::new(e),
        })?;

    if envelope.status.as_deref() != Some("success") {
        return Err(ApiError::ServerReported {
            endpoint: endpoint.to_string(),
            message: envelope
                .message
                .unwrap_or_else(|| fallback_message.to_string()),
        });
    }

    Ok(envelope)
}

fn decode_pdf(endpoint: &str, envelope: ApiEnvelope) -> Result<GeneratedPdf, ApiError> {
    let encoded = envelope.pdf_data.ok_or(ApiError::MissingField {
        endpoint: endpoint.to_string(),
        field: "pdf_data",
    })?;

    let data = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| ApiError::DecodeFailed {
            source: Box::new(e),
        })?;

    Ok(GeneratedPdf {
        filename: envelope.filename,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CompanyInfo;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    fn local_client(base_url: &str) -> ConversionClient {
        ConversionClient {
            base_url: base_url.to_string(),
            http: Client::builder().no_proxy().build().unwrap(),
        }
    }

    fn pdf(name: &str) -> SelectedFile {
        SelectedFile::new(name, "application/pdf", b"%PDF-1.4 sample".to_vec())
    }

    /// 本地 HTTP 服务器：接收一个请求并返回固定 JSON，原始请求通过 JoinHandle 取回
    async fn serve_once(response_body: impl Into<String>) -> (String, JoinHandle<String>) {
        let response_body = response_body.into();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                response_body.len(),
                response_body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });

        (base_url, handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        while !request_complete(&buf) {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn request_complete(buf: &[u8]) -> bool {
        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
        let body = &buf[header_end + 4..];

        let content_length = headers.lines().find_map(|line| {
            line.strip_prefix("content-length:")
                .and_then(|v| v.trim().parse::<usize>().ok())
        });
        match content_length {
            Some(len) => body.len() >= len,
            None if headers.contains("transfer-encoding: chunked") => body.ends_with(b"0\r\n\r\n"),
            None => true,
        }
    }

    fn request_body(request: &str) -> &str {
        request.split_once("\r\n\r\n").map(|(_, body)| body).unwrap_or("")
    }

    #[tokio::test]
    async fn test_extract_times_out_when_server_never_answers() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let client = local_client(&base_url);
        let err = client
            .extract(&pdf("a.pdf"), Duration::from_millis(300))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Timeout { ref endpoint, .. } if endpoint == UPLOAD_ENDPOINT));
        assert_eq!(err.user_message(), "处理超时");
    }

    #[tokio::test]
    async fn test_extract_sends_pdf_file_part() {
        let (base_url, server) = serve_once(
            r#"{"status":"success","file_id":"3f2a","filename":"a.pdf","extracted_data":{"price":"8万円"},"raw_text":"賃料：8万円"}"#,
        )
        .await;

        let document = local_client(&base_url)
            .extract(&pdf("a.pdf"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(document.file_id, "3f2a");
        assert_eq!(document.data.price, "8万円");
        assert_eq!(document.raw_text.as_deref(), Some("賃料：8万円"));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /upload_pdf HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("content-type: multipart/form-data"));
        assert!(request.contains(r#"name="pdf_file"; filename="a.pdf""#));
        assert!(request.to_ascii_lowercase().contains("content-type: application/pdf"));
        assert!(request.contains("%PDF-1.4 sample"));
    }

    #[tokio::test]
    async fn test_generate_posts_property_data_and_file_id() {
        let pdf_data = base64::engine::general_purpose::STANDARD.encode(b"%PDF-out");
        let (base_url, server) = serve_once(format!(
            r#"{{"status":"success","pdf_data":"{}","filename":"mysouku_3f2a.pdf"}}"#,
            pdf_data
        ))
        .await;

        let data = PropertyData {
            price: "4,500万円".to_string(),
            features: vec!["駐車場".to_string(), "南向き".to_string()],
            ..Default::default()
        };
        let pdf = local_client(&base_url)
            .generate(&data, "3f2a", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(pdf.data, b"%PDF-out");
        assert_eq!(pdf.filename.as_deref(), Some("mysouku_3f2a.pdf"));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /generate_mysouku HTTP/1.1"));
        let payload: serde_json::Value = serde_json::from_str(request_body(&request)).unwrap();
        assert_eq!(payload["file_id"], "3f2a");
        assert_eq!(payload["property_data"]["price"], "4,500万円");
        assert_eq!(
            payload["property_data"]["features"],
            serde_json::json!(["駐車場", "南向き"])
        );
    }

    #[tokio::test]
    async fn test_convert_sends_output_format_part() {
        let (base_url, server) = serve_once(r#"{"status":"success","pdf_data":"JVBERg=="}"#).await;

        let pdf = local_client(&base_url)
            .convert(&pdf("b.pdf"), OutputFormat::Combined, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(pdf.data, b"%PDF");
        assert_eq!(pdf.filename, None);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /process_pdf_simple HTTP/1.1"));
        assert!(request.contains(r#"name="pdf_file"; filename="b.pdf""#));
        assert!(request.contains("name=\"output_format\"\r\n\r\ncombined"));
    }

    #[tokio::test]
    async fn test_save_company_sends_fields_and_logo() {
        let (base_url, server) =
            serve_once(r#"{"status":"success","message":"会社情報を保存しました"}"#).await;

        let company = CompanySettings {
            info: CompanyInfo {
                company_name: "Shibuya Realty".to_string(),
                license_number: "12345".to_string(),
                ..Default::default()
            },
            logo: Some(SelectedFile::new("logo.png", "image/png", b"PNGDATA".to_vec())),
        };
        let message = local_client(&base_url)
            .save_company(&company, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(message, "会社情報を保存しました");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /save_company HTTP/1.1"));
        assert!(request.contains("name=\"company_name\"\r\n\r\nShibuya Realty"));
        assert!(request.contains("name=\"license_number\"\r\n\r\n12345"));
        assert!(request.contains("name=\"representative_name\""));
        assert!(request.contains(r#"name="logo"; filename="logo.png""#));
        assert!(request.to_ascii_lowercase().contains("content-type: image/png"));
        assert!(request.contains("PNGDATA"));
    }

    #[test]
    fn test_interpret_success_upload() {
        let body = r#"{
            "status": "success",
            "file_id": "3f2a",
            "filename": "a.pdf",
            "extracted_data": {"price": "8万円", "features": []},
            "raw_text": "賃料：8万円"
        }"#;
        let envelope = interpret_response(UPLOAD_ENDPOINT, 200, body, "上传失败").unwrap();
        assert_eq!(envelope.file_id.as_deref(), Some("3f2a"));
        assert_eq!(envelope.extracted_data.unwrap().price, "8万円");
    }

    #[test]
    fn test_interpret_server_error_uses_message() {
        let body = r#"{"status": "error", "message": "PDFファイルのみ許可されています"}"#;
        let err = interpret_response(UPLOAD_ENDPOINT, 200, body, "上传失败").unwrap_err();
        assert!(matches!(
            err,
            ApiError::ServerReported { ref message, .. } if message == "PDFファイルのみ許可されています"
        ));
    }

    #[test]
    fn test_interpret_server_error_without_message() {
        let err = interpret_response(GENERATE_ENDPOINT, 200, r#"{"status": "error"}"#, "マイソク生成失败")
            .unwrap_err();
        assert_eq!(err.user_message(), "マイソク生成失败");
    }

    #[test]
    fn test_interpret_bad_status_reads_json_message() {
        let body = r#"{"status": "error", "message": "ファイルサイズが大きすぎます（最大16MB）"}"#;
        let err = interpret_response(UPLOAD_ENDPOINT, 413, body, "上传失败").unwrap_err();
        assert!(err.is_transport());
        assert_eq!(err.user_message(), "ファイルサイズが大きすぎます（最大16MB）");

        let err = interpret_response(UPLOAD_ENDPOINT, 502, "<html>", "上传失败").unwrap_err();
        assert_eq!(err.user_message(), "HTTP 502");
    }

    #[test]
    fn test_interpret_invalid_json() {
        let err = interpret_response(UPLOAD_ENDPOINT, 200, "not json", "上传失败").unwrap_err();
        assert!(matches!(err, ApiError::JsonParseFailed { .. }));
    }

    #[test]
    fn test_decode_pdf() {
        let envelope = ApiEnvelope {
            status: Some("success".to_string()),
            pdf_data: Some(base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.4")),
            filename: Some("mysouku_3f2a.pdf".to_string()),
            ..Default::default()
        };
        let pdf = decode_pdf(GENERATE_ENDPOINT, envelope).unwrap();
        assert_eq!(pdf.data, b"%PDF-1.4");
        assert_eq!(pdf.filename.as_deref(), Some("mysouku_3f2a.pdf"));

        let missing = decode_pdf(GENERATE_ENDPOINT, ApiEnvelope::default()).unwrap_err();
        assert!(matches!(missing, ApiError::MissingField { field: "pdf_data", .. }));

        let broken = ApiEnvelope {
            pdf_data: Some("***".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            decode_pdf(GENERATE_ENDPOINT, broken),
            Err(ApiError::DecodeFailed { .. })
        ));
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let config = Config {
            server_base_url: "http://localhost:5000/".to_string(),
            ..Config::default()
        };
        let client = ConversionClient::new(&config).unwrap();
        assert_eq!(client.url(UPLOAD_ENDPOINT), "http://localhost:5000/upload_pdf");
    }

    /// 需要本地运行转换服务器：cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_extract_against_local_server() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env().unwrap();
        let client = ConversionClient::new(&config).unwrap();
        let file = SelectedFile::new("sample.pdf", "application/pdf", b"%PDF-1.4".to_vec());

        let result = client.extract(&file, Duration::from_secs(120)).await;
        println!("{:?}", result);
    }
}

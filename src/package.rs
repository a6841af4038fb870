//! Package Store Module
//!
//! XLSXパッケージ（ZIPアーカイブ）をパートパス → バイト列のマッピングとして読み込み、
//! 更新後のマッピングを再びパッケージとして書き出すモジュール。
//!
//! パートの集合は読み込みから書き出しまで変化しません。書き換えられなかったパートは
//! バイト列がそのまま出力されます。

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::XlsxlateError;
use crate::security::{validate_zip_path, SecurityConfig};

/// パッケージ内の1エントリ
#[derive(Debug, Clone)]
struct PackagePart {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    last_modified: DateTime,
    is_dir: bool,
}

/// パートパス → バイト列の順序付きマッピング
///
/// 元のアーカイブでのエントリ順を保持し、書き出し時もその順序を使用します。
#[derive(Debug, Clone)]
pub(crate) struct Package {
    parts: Vec<PackagePart>,
    index: HashMap<String, usize>,
}

impl Package {
    /// バイト列からパッケージを読み込む
    ///
    /// # 戻り値
    ///
    /// * `Ok(Package)` - 読み込みに成功した場合
    /// * `Err(XlsxlateError::MalformedPackage)` - ZIPアーカイブとして不正な場合
    /// * `Err(XlsxlateError::SecurityViolation)` - アーカイブ制限に違反した場合
    pub fn load(bytes: &[u8], security: &SecurityConfig) -> Result<Self, XlsxlateError> {
        security.check_input_size(bytes.len())?;

        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| XlsxlateError::MalformedPackage(format!("{}", e)))?;

        security.check_file_count(archive.len())?;

        let mut parts = Vec::with_capacity(archive.len());
        let mut index = HashMap::with_capacity(archive.len());
        let mut total_decompressed_size = 0u64;

        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| XlsxlateError::MalformedPackage(format!("{}", e)))?;

            let name = file.name().to_string();
            validate_zip_path(&name).map_err(|e| {
                XlsxlateError::SecurityViolation(format!("Invalid ZIP path: {}", e))
            })?;
            security.check_entry_size(&name, file.size(), &mut total_decompressed_size)?;

            // 宣言サイズを超えて展開されるエントリに備えて読み込み量も制限する
            let mut data = Vec::with_capacity(file.size() as usize);
            let read = (&mut file)
                .take(security.max_file_size + 1)
                .read_to_end(&mut data)
                .map_err(|e| {
                    XlsxlateError::MalformedPackage(format!("Failed to read '{}': {}", name, e))
                })?;
            if read as u64 > security.max_file_size {
                return Err(XlsxlateError::SecurityViolation(format!(
                    "File '{}' exceeds maximum size while decompressing",
                    name
                )));
            }

            let compression = match file.compression() {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };

            index.insert(name.clone(), parts.len());
            parts.push(PackagePart {
                name,
                data,
                compression,
                last_modified: file.last_modified(),
                is_dir: file.is_dir(),
            });
        }

        tracing::debug!("loaded package with {} parts", parts.len());

        Ok(Self { parts, index })
    }

    /// パッケージをバイト列に書き出す
    ///
    /// エントリ順・圧縮方式・更新日時は読み込み時のものを使用するため、
    /// 同じ内容からは同じバイト列が得られます。
    pub fn save(&self) -> Result<Vec<u8>, XlsxlateError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        for part in &self.parts {
            let options = FileOptions::default()
                .compression_method(part.compression)
                .last_modified_time(part.last_modified);

            if part.is_dir {
                zip.add_directory(part.name.as_str(), options)
                    .map_err(|e| XlsxlateError::MalformedPackage(format!("{}", e)))?;
                continue;
            }

            zip.start_file(part.name.as_str(), options)
                .map_err(|e| XlsxlateError::MalformedPackage(format!("{}", e)))?;
            zip.write_all(&part.data)?;
        }

        let cursor = zip
            .finish()
            .map_err(|e| XlsxlateError::MalformedPackage(format!("{}", e)))?;
        Ok(cursor.into_inner())
    }

    /// パートのバイト列を取得
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.index
            .get(name)
            .map(|&i| self.parts[i].data.as_slice())
    }

    /// パートが存在するかどうか
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// 既存パートの内容を置き換える
    ///
    /// パートの追加は行わないため、存在しないパートを指定するとエラーになります。
    pub fn replace(&mut self, name: &str, data: Vec<u8>) -> Result<(), XlsxlateError> {
        let i = *self.index.get(name).ok_or_else(|| {
            XlsxlateError::MalformedPackage(format!("Part '{}' does not exist", name))
        })?;
        self.parts[i].data = data;
        Ok(())
    }

    /// すべてのパート名（アーカイブ内の順序）
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// パート数
    pub fn len(&self) -> usize {
        self.parts.len()
    }
}

//! Translated user-facing notices.
//!
//! Every message shown to users goes through [`t`], so the deployment locale
//! decides the language. Log lines stay in English.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported message languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English.
    #[default]
    En,
    /// Bahasa Indonesia.
    Id,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => Ok(Self::En),
            "id" | "id-id" => Ok(Self::Id),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

/// Keys for every translated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    InvalidCredentials,
    RequiredFieldsEmpty,
    InvalidEmail,
    PasswordTooShort,
    PasswordsDoNotMatch,
    UnitInUseByUsers,
    DuplicateUnit,
    DuplicateEmail,
    UnknownUnit,
    DuplicateAccountCode,
    DuplicateLibraryCode,
    InvalidAmount,
    NoFileSelected,
    UnsupportedFileType,
    FileTooLarge,
    ImportFailed,
    ImportSucceeded,
    Saved,
    Deleted,
    Cleared,
    PasswordResetSent,
    PasswordResetInvalid,
    PasswordResetDone,
    Forbidden,
    NotFound,
    ServerError,
    LoggedOut,
}

/// Look up a message in the given locale.
#[must_use]
pub const fn t(locale: Locale, key: MessageKey) -> &'static str {
    use MessageKey as K;
    match locale {
        Locale::En => match key {
            K::InvalidCredentials => "Invalid email or password.",
            K::RequiredFieldsEmpty => "Please fill in all required fields.",
            K::InvalidEmail => "Please enter a valid email address.",
            K::PasswordTooShort => "Password must be at least 8 characters.",
            K::PasswordsDoNotMatch => "Passwords do not match.",
            K::UnitInUseByUsers => {
                "This unit is still assigned to users. Reassign them before deleting it."
            }
            K::DuplicateUnit => "A unit with this name already exists.",
            K::DuplicateEmail => "A user with this email already exists.",
            K::UnknownUnit => "One of the selected units no longer exists.",
            K::DuplicateAccountCode => "This account code already exists.",
            K::DuplicateLibraryCode => "This library code already exists.",
            K::InvalidAmount => {
                "Enter the value as 1,234.56 with at most two decimal places."
            }
            K::NoFileSelected => "Please choose a file to upload.",
            K::UnsupportedFileType => "Only .xlsx, .xls and .csv files are supported.",
            K::FileTooLarge => "The file is too large.",
            K::ImportFailed => "The import was rejected. Fix the rows listed below and try again.",
            K::ImportSucceeded => "Import completed.",
            K::Saved => "Changes saved.",
            K::Deleted => "Deleted.",
            K::Cleared => "All records were removed.",
            K::PasswordResetSent => {
                "If the email is registered, a password reset link has been sent."
            }
            K::PasswordResetInvalid => "This reset link is invalid or has expired.",
            K::PasswordResetDone => "Your password has been changed. Please sign in.",
            K::Forbidden => "You do not have access to this page.",
            K::NotFound => "The requested record was not found.",
            K::ServerError => "Something went wrong. Please try again.",
            K::LoggedOut => "You have been signed out.",
        },
        Locale::Id => match key {
            K::InvalidCredentials => "Email atau kata sandi salah.",
            K::RequiredFieldsEmpty => "Harap isi semua kolom wajib.",
            K::InvalidEmail => "Harap masukkan alamat email yang valid.",
            K::PasswordTooShort => "Kata sandi minimal 8 karakter.",
            K::PasswordsDoNotMatch => "Kata sandi tidak sama.",
            K::UnitInUseByUsers => {
                "Unit ini masih digunakan oleh pengguna. Pindahkan pengguna sebelum menghapus."
            }
            K::DuplicateUnit => "Unit dengan nama ini sudah ada.",
            K::DuplicateEmail => "Pengguna dengan email ini sudah ada.",
            K::UnknownUnit => "Salah satu unit yang dipilih sudah tidak ada.",
            K::DuplicateAccountCode => "Kode akun ini sudah ada.",
            K::DuplicateLibraryCode => "Kode library ini sudah ada.",
            K::InvalidAmount => {
                "Masukkan nilai seperti 1,234.56 dengan paling banyak dua angka desimal."
            }
            K::NoFileSelected => "Silakan pilih file untuk diunggah.",
            K::UnsupportedFileType => "Hanya file .xlsx, .xls dan .csv yang didukung.",
            K::FileTooLarge => "Ukuran file terlalu besar.",
            K::ImportFailed => "Impor ditolak. Perbaiki baris di bawah lalu coba lagi.",
            K::ImportSucceeded => "Impor selesai.",
            K::Saved => "Perubahan disimpan.",
            K::Deleted => "Data dihapus.",
            K::Cleared => "Semua data telah dihapus.",
            K::PasswordResetSent => {
                "Jika email terdaftar, tautan reset kata sandi telah dikirim."
            }
            K::PasswordResetInvalid => "Tautan reset tidak valid atau sudah kedaluwarsa.",
            K::PasswordResetDone => "Kata sandi berhasil diubah. Silakan masuk.",
            K::Forbidden => "Anda tidak memiliki akses ke halaman ini.",
            K::NotFound => "Data tidak ditemukan.",
            K::ServerError => "Terjadi kesalahan. Silakan coba lagi.",
            K::LoggedOut => "Anda telah keluar.",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_parse() {
        assert_eq!("EN".parse::<Locale>(), Ok(Locale::En));
        assert_eq!("id-ID".parse::<Locale>(), Ok(Locale::Id));
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn test_messages_differ_by_locale() {
        let en = t(Locale::En, MessageKey::InvalidCredentials);
        let id = t(Locale::Id, MessageKey::InvalidCredentials);
        assert_ne!(en, id);
        assert!(!en.is_empty() && !id.is_empty());
    }

    #[test]
    fn test_unit_in_use_message_mentions_users() {
        assert!(t(Locale::En, MessageKey::UnitInUseByUsers).contains("users"));
        assert!(t(Locale::Id, MessageKey::UnitInUseByUsers).contains("pengguna"));
    }
}

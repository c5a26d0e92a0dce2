//! キーと値のデシリアライザ。
//!
//! 数値型はKafka標準のシリアライザと同じビッグエンディアンで解釈する。
use crate::kafka::key::Partition;
use crate::kafka::message::Header;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("DeserializeError: {msg}")]
pub struct DeserializeError {
    msg: String,
    #[source]
    source: Option<anyhow::Error>,
}

impl DeserializeError {
    pub fn new(msg: &str) -> Self {
        Self {
            msg: msg.to_string(),
            source: None,
        }
    }

    pub fn with_source<E>(msg: &str, source: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self {
            msg: msg.to_string(),
            source: Some(source.into()),
        }
    }
}

/// 生のバイト列を`Output`に変換する。
///
/// null のキー/値はデシリアライザを呼ばずに`None`になる。
pub trait Deserializer: Send + Sync + 'static {
    type Output;
    fn deserialize(
        &self,
        topic: &str,
        partition: Partition,
        headers: &[Header],
        data: &[u8],
    ) -> Result<Self::Output, DeserializeError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BytesDeserializer;

impl Deserializer for BytesDeserializer {
    type Output = Vec<u8>;

    fn deserialize(
        &self,
        _topic: &str,
        _partition: Partition,
        _headers: &[Header],
        data: &[u8],
    ) -> Result<Vec<u8>, DeserializeError> {
        Ok(data.to_vec())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct StringDeserializer;

impl Deserializer for StringDeserializer {
    type Output = String;

    fn deserialize(
        &self,
        _topic: &str,
        _partition: Partition,
        _headers: &[Header],
        data: &[u8],
    ) -> Result<String, DeserializeError> {
        String::from_utf8(data.to_vec())
            .map_err(|e| DeserializeError::with_source("invalid utf-8 string", e))
    }
}

macro_rules! be_deserializer {
    ($name: ident, $ty: ty) => {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $name;

        impl Deserializer for $name {
            type Output = $ty;

            fn deserialize(
                &self,
                _topic: &str,
                _partition: Partition,
                _headers: &[Header],
                data: &[u8],
            ) -> Result<$ty, DeserializeError> {
                let bytes = data.try_into().map_err(|_| {
                    DeserializeError::new(&format!(
                        "expected {} bytes for {} but got {}",
                        std::mem::size_of::<$ty>(),
                        stringify!($ty),
                        data.len()
                    ))
                })?;
                Ok(<$ty>::from_be_bytes(bytes))
            }
        }
    };
}

be_deserializer!(I32Deserializer, i32);
be_deserializer!(I64Deserializer, i64);
be_deserializer!(F32Deserializer, f32);
be_deserializer!(F64Deserializer, f64);

pub struct JsonDeserializer<T> {
    _phantom: PhantomData<fn() -> T>,
}

impl<T> JsonDeserializer<T> {
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for JsonDeserializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for JsonDeserializer<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Deserializer for JsonDeserializer<T>
where
    T: DeserializeOwned + 'static,
{
    type Output = T;

    fn deserialize(
        &self,
        topic: &str,
        _partition: Partition,
        _headers: &[Header],
        data: &[u8],
    ) -> Result<T, DeserializeError> {
        serde_json::from_slice(data).map_err(|e| {
            DeserializeError::with_source(&format!("invalid json on topic {}", topic), e)
        })
    }
}

/// クロージャをデシリアライザとして使う。
pub struct FnDeserializer<F, T> {
    f: F,
    _phantom: PhantomData<fn() -> T>,
}

pub fn from_fn<F, T>(f: F) -> FnDeserializer<F, T>
where
    F: Fn(&str, Partition, &[Header], &[u8]) -> Result<T, DeserializeError> + Send + Sync + 'static,
{
    FnDeserializer {
        f,
        _phantom: PhantomData,
    }
}

impl<F, T> Deserializer for FnDeserializer<F, T>
where
    F: Fn(&str, Partition, &[Header], &[u8]) -> Result<T, DeserializeError> + Send + Sync + 'static,
    T: 'static,
{
    type Output = T;

    fn deserialize(
        &self,
        topic: &str,
        partition: Partition,
        headers: &[Header],
        data: &[u8],
    ) -> Result<T, DeserializeError> {
        (self.f)(topic, partition, headers, data)
    }
}

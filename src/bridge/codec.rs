// In: src/bridge/codec.rs

//! The stateful facade: a `DeltaCodec` owns a shared config, the finisher it
//! selects, and optionally a dedicated worker pool. Every call is independent;
//! nothing is retained between calls.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::block_pipeline::frame::peek_frame_info;
use crate::block_pipeline::PipelineContext;
use crate::bridge::format::FrameInfo;
use crate::config::CodecConfig;
use crate::error::DeltaCodecError;
use crate::finishers::{finisher_for, Finisher};
use crate::frame_pipeline::{
    self, encode_frame, EncodingArgs, EncodingDescriptor, FrameReader, MapEncodingArgs,
    RecordEncodingArgs, RecordSchema, TypedVector, VectorEncoder,
};
use crate::traits::DeltaValue;

pub struct DeltaCodec {
    config: Arc<CodecConfig>,
    finisher: Arc<dyn Finisher>,
    pool: Option<rayon::ThreadPool>,
}

impl fmt::Debug for DeltaCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeltaCodec")
            .field("config", &self.config)
            .field("finisher", &self.finisher.name())
            .field("dedicated_pool", &self.pool.is_some())
            .finish()
    }
}

impl DeltaCodec {
    /// Builds a codec with the finisher named by `config.finisher`.
    ///
    /// # Errors
    /// `InvalidArgument` for an invalid config, `ThreadPool` if the dedicated
    /// pool cannot be created.
    pub fn new(config: Arc<CodecConfig>) -> Result<Self, DeltaCodecError> {
        let finisher = finisher_for(config.finisher);
        Self::with_finisher(config, finisher)
    }

    /// Builds a codec around a caller-supplied finisher. `config.finisher` is
    /// ignored.
    pub fn with_finisher(
        config: Arc<CodecConfig>,
        finisher: Arc<dyn Finisher>,
    ) -> Result<Self, DeltaCodecError> {
        config.validate()?;
        let pool = match config.worker_threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("deltacodec-{}", i))
                    .build()?,
            ),
            None => None,
        };
        log::debug!(
            "created codec: finisher={}, transform={:?}, max blocks={}, worker threads={:?}",
            finisher.name(),
            config.transform,
            config.max_num_parallel_blocks,
            config.worker_threads
        );
        Ok(Self {
            config,
            finisher,
            pool,
        })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn finisher(&self) -> &Arc<dyn Finisher> {
        &self.finisher
    }

    fn context(&self) -> PipelineContext {
        PipelineContext::new(Arc::clone(&self.finisher), self.config.transform)
    }

    /// Runs `op` on the dedicated pool when there is one.
    fn run<F, O>(&self, op: F) -> O
    where
        F: FnOnce() -> O + Send,
        O: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    //==================================================================================
    // 1. Single Column
    //==================================================================================

    pub fn encode<T: DeltaValue>(&self, args: &EncodingArgs<'_, T>) -> Result<Vec<u8>, DeltaCodecError> {
        let vector = TypedVector::borrowed(args.data, &args.settings)?;
        let vectors: Vec<Box<dyn VectorEncoder + '_>> = vec![Box::new(vector)];
        let ctx = self.context();
        self.run(|| {
            encode_frame(
                &vectors,
                args.num_blocks(),
                self.config.max_num_parallel_blocks,
                &ctx,
            )
        })
    }

    pub fn decode<T: DeltaValue>(&self, bytes: &[u8]) -> Result<Vec<T>, DeltaCodecError> {
        let reader = FrameReader::open(bytes, 1, Arc::clone(&self.finisher))?;
        self.run(|| reader.decode_vector::<T>(0))
    }

    //==================================================================================
    // 2. Multi-Field Records
    //==================================================================================

    pub fn encode_records<R: Send + Sync + 'static>(
        &self,
        schema: &RecordSchema<R>,
        args: &RecordEncodingArgs<'_, R>,
    ) -> Result<Vec<u8>, DeltaCodecError> {
        let settings = args.column_settings()?;
        let ctx = self.context();
        self.run(|| {
            frame_pipeline::encode_records(
                args.data,
                schema,
                &settings,
                args.num_blocks(),
                self.config.max_num_parallel_blocks,
                &ctx,
            )
        })
    }

    pub fn decode_records<R: Default + Send + Sync + 'static>(
        &self,
        schema: &RecordSchema<R>,
        bytes: &[u8],
    ) -> Result<Vec<R>, DeltaCodecError> {
        self.run(|| frame_pipeline::decode_records(bytes, schema, Arc::clone(&self.finisher)))
    }

    //==================================================================================
    // 3. Maps
    //==================================================================================

    /// Encodes a map as a key vector followed by a value vector. Entries are
    /// taken in the map's iteration order.
    pub fn encode_map<K: DeltaValue, V: DeltaValue>(
        &self,
        args: &MapEncodingArgs<'_, K, V>,
    ) -> Result<Vec<u8>, DeltaCodecError> {
        let (keys, values): (Vec<K>, Vec<V>) = args
            .data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .unzip();
        let vectors: Vec<Box<dyn VectorEncoder>> = vec![
            Box::new(TypedVector::owned(keys, &args.key_settings)?),
            Box::new(TypedVector::owned(values, &args.value_settings)?),
        ];
        let ctx = self.context();
        self.run(|| {
            encode_frame(
                &vectors,
                args.num_blocks(),
                self.config.max_num_parallel_blocks,
                &ctx,
            )
        })
    }

    /// # Errors
    /// `CorruptData` if the key and value vectors differ in length or a key
    /// repeats.
    pub fn decode_map<K, V>(&self, bytes: &[u8]) -> Result<HashMap<K, V>, DeltaCodecError>
    where
        K: DeltaValue + Eq + Hash,
        V: DeltaValue,
    {
        let reader = FrameReader::open(bytes, 2, Arc::clone(&self.finisher))?;
        let (keys, values) = self.run(|| {
            rayon::join(
                || reader.decode_vector::<K>(0),
                || reader.decode_vector::<V>(1),
            )
        });
        let (keys, values) = (keys?, values?);
        if keys.len() != values.len() {
            return Err(DeltaCodecError::CorruptData(format!(
                "map frame has {} keys but {} values",
                keys.len(),
                values.len()
            )));
        }
        let expected = keys.len();
        let map: HashMap<K, V> = keys.into_iter().zip(values).collect();
        if map.len() != expected {
            return Err(DeltaCodecError::CorruptData(format!(
                "map frame repeats {} keys",
                expected - map.len()
            )));
        }
        Ok(map)
    }

    //==================================================================================
    // 4. Inspection
    //==================================================================================

    /// Describes a frame without decompressing any payload.
    pub fn analyze(&self, bytes: &[u8]) -> Result<FrameInfo, DeltaCodecError> {
        peek_frame_info(bytes)
    }
}

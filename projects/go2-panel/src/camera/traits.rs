use anyhow::Result;
use async_trait::async_trait;
use url::Url;

/// Throwaway request used to test whether the continuous stream is usable.
///
/// `Ok` means the probe loaded, `Err` means it failed. Implementations may also
/// never resolve; the selector's decision window covers that case.
#[async_trait]
pub trait CameraProbe: Send + Sync {
    async fn probe(&self, url: &Url) -> Result<()>;
}

/// Where the chosen feed is shown. Calls must not block.
pub trait CameraSurface: Send + Sync {
    fn set_status(&self, text: &str);
    fn bind_stream(&self, url: Url);
    fn show_frame(&self, url: Url);
}

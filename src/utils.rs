/// 安装 panic 钩子，让 wasm 里的 panic 信息打印到浏览器控制台。
/// 只有启用了 `console_error_panic_hook` 特性才会生效，重复调用没有影响。
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

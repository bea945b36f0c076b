mod binance_http;
